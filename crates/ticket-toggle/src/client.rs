use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::activation::{ActivationRequest, RecordKind};
use crate::config::{MIN_TIMEOUT_MS, TicketClientConfig, normalize_api_prefix, normalize_base_url};
use crate::csrf::{CSRF_HEADER_NAME, CsrfToken};
use crate::transport::{
    ActivationTransport, HttpMethod, JSON_CONTENT_TYPE, OutgoingRequest, TransportResponse,
};

#[derive(Debug, Clone)]
pub struct TicketApiClient {
    base_url: String,
    api_prefix: String,
    timeout: Duration,
    http: reqwest::Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketClientError {
    #[error("ticket_client_base_url_missing")]
    BaseUrlMissing,
    #[error("ticket_client_base_url_invalid")]
    InvalidBaseUrl,
    #[error("ticket_client_invalid_path")]
    InvalidPath,
    #[error("ticket_request_failed:{message}")]
    Request { message: String },
    #[error("ticket_read_failed:{message}")]
    Read { message: String },
    #[error("ticket_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("ticket_json_decode_failed:{message}")]
    Decode { message: String },
}

impl TicketApiClient {
    pub fn new(config: TicketClientConfig) -> Result<Self, TicketClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        if config.timeout_ms < MIN_TIMEOUT_MS {
            tracing::warn!(
                requested_ms = config.timeout_ms,
                applied_ms = MIN_TIMEOUT_MS,
                "request timeout below minimum; raising it"
            );
        }
        Ok(Self {
            base_url,
            api_prefix: normalize_api_prefix(&config.api_prefix),
            timeout: Duration::from_millis(config.timeout_ms.max(MIN_TIMEOUT_MS)),
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn from_env() -> Result<Self, TicketClientError> {
        Self::new(TicketClientConfig::from_env()?)
    }

    #[must_use]
    pub fn api_prefix(&self) -> &str {
        self.api_prefix.as_str()
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    #[must_use]
    pub fn record_path(&self, kind: &RecordKind, resource_id: &str) -> String {
        kind.record_path(&self.api_prefix, resource_id)
    }

    /// `PUT` the soft-delete flag of one record.
    pub async fn update_activation(
        &self,
        request: &ActivationRequest,
        csrf_token: Option<CsrfToken>,
        cookies: Option<String>,
    ) -> Result<TransportResponse, TicketClientError> {
        self.execute(OutgoingRequest::activation(
            request,
            &self.api_prefix,
            csrf_token,
            cookies,
        ))
        .await
    }

    /// `DELETE` a record. The admin API answers 204 and only flips
    /// `is_deleted`; the row stays in storage.
    pub async fn soft_delete(
        &self,
        kind: &RecordKind,
        resource_id: &str,
        csrf_token: Option<CsrfToken>,
        cookies: Option<String>,
    ) -> Result<TransportResponse, TicketClientError> {
        self.execute(OutgoingRequest {
            method: HttpMethod::Delete,
            path: self.record_path(kind, resource_id),
            csrf_token,
            cookies,
            body: None,
        })
        .await
    }

    /// Fetches the `results` entity of one record. Soft-deleted records are
    /// hidden by the API, so a 404 maps to `None`.
    pub async fn fetch_record(
        &self,
        kind: &RecordKind,
        resource_id: &str,
        cookies: Option<String>,
    ) -> Result<Option<Value>, TicketClientError> {
        let request = OutgoingRequest {
            method: HttpMethod::Get,
            path: self.record_path(kind, resource_id),
            csrf_token: None,
            cookies,
            body: None,
        };
        match self.execute(request).await {
            Ok(response) => Ok(response.record),
            Err(TicketClientError::Http { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Sends one request, without retries.
    pub async fn execute(
        &self,
        request: OutgoingRequest,
    ) -> Result<TransportResponse, TicketClientError> {
        let url = self
            .endpoint(&request.path)
            .ok_or(TicketClientError::InvalidPath)?;

        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(url.as_str()),
            HttpMethod::Put => self.http.put(url.as_str()),
            HttpMethod::Delete => self.http.delete(url.as_str()),
        }
        .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
        .timeout(self.timeout);

        if request.method != HttpMethod::Get {
            builder = builder.header(CSRF_HEADER_NAME, request.csrf_header_value());
        }
        if let Some(cookies) = request.cookies.as_deref().filter(|raw| !raw.is_empty()) {
            builder = builder.header(COOKIE, cookies);
        }
        if let Some(body) = request.body.as_ref() {
            let bytes = serde_json::to_vec(body).map_err(|error| TicketClientError::Decode {
                message: error.to_string(),
            })?;
            builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(bytes);
        }

        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            "sending ticket admin request"
        );

        let response = builder
            .send()
            .await
            .map_err(|error| TicketClientError::Request {
                message: error.to_string(),
            })?;
        decode_response(response).await
    }
}

#[async_trait]
impl ActivationTransport for TicketApiClient {
    fn api_prefix(&self) -> &str {
        self.api_prefix.as_str()
    }

    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, TicketClientError> {
        self.execute(request).await
    }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> TicketClientError {
    let body = non_empty_string(String::from_utf8_lossy(body).to_string())
        .unwrap_or_else(|| "<empty>".to_string());
    TicketClientError::Http { status, body }
}

async fn decode_response(response: reqwest::Response) -> Result<TransportResponse, TicketClientError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| TicketClientError::Read {
            message: error.to_string(),
        })?;

    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }

    Ok(TransportResponse {
        status: status.as_u16(),
        record: results_entity(&bytes),
    })
}

/// Pulls the entity out of the `{"results": ...}` envelope. Success bodies
/// are optional, so anything unreadable is dropped rather than failing the
/// request.
fn results_entity(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(mut object)) => match object.remove("results") {
            Some(results) => Some(results),
            None => Some(Value::Object(object)),
        },
        Ok(Value::Null) => None,
        Ok(other) => Some(other),
        Err(error) => {
            tracing::debug!(error = %error, "ignoring non-json success body");
            None
        }
    }
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
