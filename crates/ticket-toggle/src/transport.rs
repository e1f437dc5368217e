use async_trait::async_trait;
use serde_json::Value;

use crate::activation::ActivationRequest;
use crate::client::TicketClientError;
use crate::csrf::CsrfToken;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// A fully described request against the admin API, independent of the
/// HTTP library that ends up sending it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub path: String,
    pub csrf_token: Option<CsrfToken>,
    /// Raw cookie string forwarded as the `Cookie` header.
    pub cookies: Option<String>,
    pub body: Option<Value>,
}

impl OutgoingRequest {
    #[must_use]
    pub fn activation(
        request: &ActivationRequest,
        api_prefix: &str,
        csrf_token: Option<CsrfToken>,
        cookies: Option<String>,
    ) -> Self {
        Self {
            method: HttpMethod::Put,
            path: request.path(api_prefix),
            csrf_token,
            cookies,
            body: Some(request.body()),
        }
    }

    /// Value of `X-CSRFToken`; empty when no token cookie was present.
    #[must_use]
    pub fn csrf_header_value(&self) -> &str {
        self.csrf_token.as_ref().map_or("", CsrfToken::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// The `results` entity returned by the server, when it sent one.
    pub record: Option<Value>,
}

#[async_trait]
pub trait ActivationTransport: Send + Sync {
    /// Prefix every record path is built under, e.g. `/api`.
    fn api_prefix(&self) -> &str;

    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, TicketClientError>;
}

#[async_trait]
impl<T: ActivationTransport + ?Sized> ActivationTransport for std::sync::Arc<T> {
    fn api_prefix(&self) -> &str {
        (**self).api_prefix()
    }

    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, TicketClientError> {
        (**self).send(request).await
    }
}
