use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::activation::RecordKind;
use crate::client::TicketClientError;
use crate::csrf::{CookieSource, csrf_token};
use crate::element::{ElementError, ToggleElement};
use crate::transport::{ActivationTransport, OutgoingRequest};

#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error(transparent)]
    Element(#[from] ElementError),
    #[error("toggle_transport_failed:{0}")]
    Transport(#[from] TicketClientError),
    #[error("toggle_refresh_failed:{0}")]
    Refresh(#[from] RefreshError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RefreshError {
    pub message: String,
}

impl RefreshError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What the server accepted, handed to the refresher after a successful
/// toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReceipt {
    pub kind: RecordKind,
    pub resource_id: String,
    pub is_deleted: bool,
    pub status: u16,
    pub record: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The clicked element is not an activation toggle.
    Ignored,
    Toggled(ActivationReceipt),
}

/// Brings the view back in sync after a toggle. A browser host reloads the
/// whole document; other hosts can re-render just the affected record.
#[async_trait]
pub trait PageRefresher: Send + Sync {
    async fn refresh(&self, receipt: &ActivationReceipt) -> Result<(), RefreshError>;
}

#[async_trait]
impl<T: PageRefresher + ?Sized> PageRefresher for std::sync::Arc<T> {
    async fn refresh(&self, receipt: &ActivationReceipt) -> Result<(), RefreshError> {
        (**self).refresh(receipt).await
    }
}

/// Full-page reload stand-in that only counts how often it was asked to
/// reload.
#[derive(Debug, Default)]
pub struct CountingRefresher {
    reloads: AtomicUsize,
}

impl CountingRefresher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRefresher for CountingRefresher {
    async fn refresh(&self, _receipt: &ActivationReceipt) -> Result<(), RefreshError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Turns a click on an activation toggle into exactly one `PUT` and, once
/// the server accepts it, one refresh.
///
/// The controller holds no per-click state. Concurrent clicks each send
/// their own request; nothing is de-duplicated, cancelled or retried.
pub struct ToggleController<T, C, R> {
    transport: T,
    cookies: C,
    refresher: R,
}

impl<T, C, R> ToggleController<T, C, R>
where
    T: ActivationTransport,
    C: CookieSource,
    R: PageRefresher,
{
    #[must_use]
    pub fn new(transport: T, cookies: C, refresher: R) -> Self {
        Self {
            transport,
            cookies,
            refresher,
        }
    }

    #[must_use]
    pub fn refresher(&self) -> &R {
        &self.refresher
    }

    /// Entry point for every click on the page. Elements without a toggle
    /// role are ignored.
    pub async fn dispatch(&self, element: &ToggleElement) -> Result<ClickOutcome, ToggleError> {
        if element.role().is_none() {
            return Ok(ClickOutcome::Ignored);
        }
        self.handle_click(element).await.map(ClickOutcome::Toggled)
    }

    pub async fn handle_click(
        &self,
        element: &ToggleElement,
    ) -> Result<ActivationReceipt, ToggleError> {
        let request = element.activation_request()?;
        let cookies = self.cookies.cookie_string();
        let token = cookies.as_deref().and_then(csrf_token);
        if token.is_none() {
            tracing::warn!(
                resource_id = %request.resource_id,
                "no csrf token cookie; the server will likely reject the update"
            );
        }

        let outgoing =
            OutgoingRequest::activation(&request, self.transport.api_prefix(), token, cookies);
        tracing::debug!(
            kind = request.kind.as_str(),
            resource_id = %request.resource_id,
            is_deleted = request.is_deleted,
            path = %outgoing.path,
            "dispatching activation toggle"
        );

        let response = match self.transport.send(outgoing).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(
                    kind = request.kind.as_str(),
                    resource_id = %request.resource_id,
                    error = %error,
                    "activation toggle failed"
                );
                return Err(error.into());
            }
        };

        let receipt = ActivationReceipt {
            kind: request.kind,
            resource_id: request.resource_id,
            is_deleted: request.is_deleted,
            status: response.status,
            record: response.record,
        };
        tracing::info!(
            kind = receipt.kind.as_str(),
            resource_id = %receipt.resource_id,
            is_deleted = receipt.is_deleted,
            status = receipt.status,
            "activation toggled"
        );

        self.refresher.refresh(&receipt).await?;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::csrf::{CsrfToken, SharedCookieJar, StaticCookies};
    use crate::element::{ANSWER_TOGGLE_CLASS, ATTR_ACTION, ATTR_ID, ATTR_TICKET_ID};
    use crate::transport::{HttpMethod, TransportResponse};

    struct RecordingTransport {
        api_prefix: String,
        sent: Mutex<Vec<OutgoingRequest>>,
        fail_with: Option<TicketClientError>,
    }

    impl Default for RecordingTransport {
        fn default() -> Self {
            Self::with_prefix("/api")
        }
    }

    impl RecordingTransport {
        fn with_prefix(api_prefix: &str) -> Self {
            Self {
                api_prefix: api_prefix.to_string(),
                sent: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(error: TicketClientError) -> Self {
            Self {
                fail_with: Some(error),
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<OutgoingRequest> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ActivationTransport for RecordingTransport {
        fn api_prefix(&self) -> &str {
            self.api_prefix.as_str()
        }

        async fn send(
            &self,
            request: OutgoingRequest,
        ) -> Result<TransportResponse, TicketClientError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(request);
            }
            match self.fail_with.clone() {
                Some(error) => Err(error),
                None => Ok(TransportResponse {
                    status: 200,
                    record: Some(json!({"id": 42})),
                }),
            }
        }
    }

    struct FailingRefresher;

    #[async_trait]
    impl PageRefresher for FailingRefresher {
        async fn refresh(&self, _receipt: &ActivationReceipt) -> Result<(), RefreshError> {
            Err(RefreshError::new("view gone"))
        }
    }

    #[tokio::test]
    async fn activate_click_sends_one_put_and_reloads_once() {
        let transport = Arc::new(RecordingTransport::default());
        let refresher = Arc::new(CountingRefresher::new());
        let controller = ToggleController::new(
            transport.clone(),
            StaticCookies::new("sessionid=s; csrftoken=abc123"),
            refresher.clone(),
        );

        let receipt = controller
            .handle_click(&ToggleElement::ticket("42", "Activate"))
            .await
            .expect("toggle succeeds");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(sent[0].path, "/api/tickets/42/");
        assert_eq!(sent[0].csrf_token, Some(CsrfToken::new("abc123")));
        assert_eq!(
            sent[0].body,
            Some(json!({"ticket": {"is_deleted": false}}))
        );
        assert_eq!(refresher.reloads(), 1);
        assert!(!receipt.is_deleted);
        assert_eq!(receipt.record, Some(json!({"id": 42})));
    }

    #[tokio::test]
    async fn non_activate_labels_soft_delete() {
        for label in ["Deactivate", "", "activate"] {
            let transport = Arc::new(RecordingTransport::default());
            let controller = ToggleController::new(
                transport.clone(),
                StaticCookies::default(),
                CountingRefresher::new(),
            );
            controller
                .handle_click(&ToggleElement::ticket("7", label))
                .await
                .expect("toggle succeeds");
            assert_eq!(
                transport.sent()[0].body,
                Some(json!({"ticket": {"is_deleted": true}})),
                "label {label:?}"
            );
        }
    }

    #[tokio::test]
    async fn token_is_read_fresh_for_every_click() {
        let transport = Arc::new(RecordingTransport::default());
        let jar = Arc::new(SharedCookieJar::new("csrftoken=first"));
        let controller =
            ToggleController::new(transport.clone(), jar.clone(), CountingRefresher::new());

        let element = ToggleElement::ticket("1", "Activate");
        controller.handle_click(&element).await.expect("first");
        jar.replace("csrftoken=second");
        controller.handle_click(&element).await.expect("second");

        let tokens: Vec<String> = transport
            .sent()
            .iter()
            .map(|request| request.csrf_header_value().to_string())
            .collect();
        assert_eq!(tokens, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn missing_cookie_still_sends_request_with_empty_token() {
        let transport = Arc::new(RecordingTransport::default());
        let controller = ToggleController::new(
            transport.clone(),
            StaticCookies::new("foo=bar"),
            CountingRefresher::new(),
        );
        controller
            .handle_click(&ToggleElement::ticket("3", "Activate"))
            .await
            .expect("toggle succeeds");
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].csrf_header_value(), "");
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced_without_reload() {
        let transport = RecordingTransport::failing(TicketClientError::Request {
            message: "connection refused".to_string(),
        });
        let refresher = Arc::new(CountingRefresher::new());
        let controller = ToggleController::new(
            transport,
            StaticCookies::new("csrftoken=abc"),
            refresher.clone(),
        );

        let error = controller
            .handle_click(&ToggleElement::ticket("3", "Activate"))
            .await
            .expect_err("transport error");
        assert!(matches!(error, ToggleError::Transport(_)));
        assert_eq!(
            error.to_string(),
            "toggle_transport_failed:ticket_request_failed:connection refused"
        );
        assert_eq!(refresher.reloads(), 0);
    }

    #[tokio::test]
    async fn refresher_failure_is_reported() {
        let controller = ToggleController::new(
            RecordingTransport::default(),
            StaticCookies::new("csrftoken=abc"),
            FailingRefresher,
        );
        let error = controller
            .handle_click(&ToggleElement::ticket("3", "Activate"))
            .await
            .expect_err("refresh error");
        assert_eq!(error.to_string(), "toggle_refresh_failed:view gone");
    }

    #[tokio::test]
    async fn dispatch_ignores_elements_without_toggle_role() {
        let transport = Arc::new(RecordingTransport::default());
        let controller = ToggleController::new(
            transport.clone(),
            StaticCookies::default(),
            CountingRefresher::new(),
        );
        let element = ToggleElement::new()
            .with_class("btn")
            .with_attr(ATTR_ID, "1")
            .with_attr(ATTR_ACTION, "Activate");

        let outcome = controller.dispatch(&element).await.expect("dispatch");
        assert_eq!(outcome, ClickOutcome::Ignored);
        assert!(transport.sent().is_empty());
        assert_eq!(controller.refresher().reloads(), 0);
    }

    #[tokio::test]
    async fn answer_toggle_targets_nested_resource() {
        let transport = Arc::new(RecordingTransport::with_prefix("/backend/api"));
        let controller = ToggleController::new(
            transport.clone(),
            StaticCookies::new("csrftoken=t"),
            CountingRefresher::new(),
        );
        let element = ToggleElement::new()
            .with_class(ANSWER_TOGGLE_CLASS)
            .with_attr(ATTR_ID, "9")
            .with_attr(ATTR_TICKET_ID, "7")
            .with_attr(ATTR_ACTION, "Deactivate");

        let outcome = controller.dispatch(&element).await.expect("dispatch");
        assert!(matches!(outcome, ClickOutcome::Toggled(_)));
        let sent = transport.sent();
        assert_eq!(sent[0].path, "/backend/api/tickets/7/answers/9/");
        assert_eq!(sent[0].body, Some(json!({"answer": {"is_deleted": true}})));
    }

    #[tokio::test]
    async fn element_errors_send_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let controller = ToggleController::new(
            transport.clone(),
            StaticCookies::default(),
            CountingRefresher::new(),
        );
        let element = ToggleElement::new()
            .with_class(crate::element::TICKET_TOGGLE_CLASS)
            .with_attr(ATTR_ACTION, "Activate");
        let error = controller
            .dispatch(&element)
            .await
            .expect_err("missing id");
        assert!(matches!(
            error,
            ToggleError::Element(ElementError::MissingIdentifier)
        ));
        assert!(transport.sent().is_empty());
    }
}
