use crate::client::TicketClientError;

pub const DEFAULT_ADMIN_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 1_500;
pub const MIN_TIMEOUT_MS: u64 = 250;

pub const ENV_ADMIN_BASE_URL: &str = "TICKET_ADMIN_BASE_URL";
pub const ENV_ADMIN_TIMEOUT_MS: &str = "TICKET_ADMIN_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketClientConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub timeout_ms: u64,
}

impl TicketClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Reads `TICKET_ADMIN_BASE_URL` and `TICKET_ADMIN_TIMEOUT_MS`, falling
    /// back to the local development server.
    pub fn from_env() -> Result<Self, TicketClientError> {
        let base_url =
            env_non_empty(ENV_ADMIN_BASE_URL).unwrap_or_else(|| DEFAULT_ADMIN_BASE_URL.to_string());
        let mut config = Self::new(normalize_base_url(&base_url)?);
        if let Some(raw) = env_non_empty(ENV_ADMIN_TIMEOUT_MS) {
            match raw.parse::<u64>() {
                Ok(timeout_ms) => config.timeout_ms = timeout_ms,
                Err(_) => {
                    tracing::warn!(
                        value = %raw,
                        default = DEFAULT_TIMEOUT_MS,
                        "ignoring invalid {ENV_ADMIN_TIMEOUT_MS}"
                    );
                }
            }
        }
        Ok(config)
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, TicketClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(TicketClientError::BaseUrlMissing);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(TicketClientError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(TicketClientError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(TicketClientError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_api_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
