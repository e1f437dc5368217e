pub mod activation;
pub mod client;
pub mod config;
pub mod controller;
pub mod csrf;
pub mod element;
pub mod transport;

pub use activation::{ACTIVATE_LABEL, ActivationAction, ActivationRequest, RecordKind};
pub use client::{TicketApiClient, TicketClientError, format_http_error};
pub use config::{
    DEFAULT_ADMIN_BASE_URL, DEFAULT_API_PREFIX, DEFAULT_TIMEOUT_MS, ENV_ADMIN_BASE_URL,
    ENV_ADMIN_TIMEOUT_MS, TicketClientConfig, normalize_base_url,
};
pub use controller::{
    ActivationReceipt, ClickOutcome, CountingRefresher, PageRefresher, RefreshError,
    ToggleController, ToggleError,
};
pub use csrf::{
    CSRF_COOKIE_NAME, CSRF_HEADER_NAME, CookieSource, CsrfToken, SharedCookieJar, StaticCookies,
    cookie_value, csrf_token,
};
pub use element::{
    ANSWER_TOGGLE_CLASS, ATTR_ACTION, ATTR_DELETED, ATTR_ID, ATTR_TICKET_ID, ElementError,
    TICKET_TOGGLE_CLASS, ToggleElement, ToggleRole,
};
pub use transport::{
    ActivationTransport, HttpMethod, JSON_CONTENT_TYPE, OutgoingRequest, TransportResponse,
};
