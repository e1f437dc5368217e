use std::sync::RwLock;

pub const CSRF_COOKIE_NAME: &str = "csrftoken";
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

/// Token the admin backend expects echoed back on state-changing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Read access to the raw `name=value; name=value` cookie string of the page.
///
/// Implementations are consulted on every click; nothing is cached between
/// requests.
pub trait CookieSource: Send + Sync {
    fn cookie_string(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticCookies(String);

impl StaticCookies {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl CookieSource for StaticCookies {
    fn cookie_string(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Cookie store that can be rewritten while a controller holds it, the way a
/// browser rotates `csrftoken` after login.
#[derive(Debug, Default)]
pub struct SharedCookieJar {
    raw: RwLock<String>,
}

impl SharedCookieJar {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: RwLock::new(raw.into()),
        }
    }

    pub fn replace(&self, raw: impl Into<String>) {
        match self.raw.write() {
            Ok(mut guard) => *guard = raw.into(),
            Err(poisoned) => *poisoned.into_inner() = raw.into(),
        }
    }
}

impl CookieSource for SharedCookieJar {
    fn cookie_string(&self) -> Option<String> {
        let raw = match self.raw.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if raw.is_empty() { None } else { Some(raw) }
    }
}

impl<T: CookieSource + ?Sized> CookieSource for std::sync::Arc<T> {
    fn cookie_string(&self) -> Option<String> {
        (**self).cookie_string()
    }
}

/// Returns the URL-decoded value of the first cookie called `name`.
///
/// Entries are split on `;` and trimmed; only an exact `name=` prefix
/// matches, so `xcsrftoken=` never shadows `csrftoken=`.
#[must_use]
pub fn cookie_value(raw: &str, name: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let prefix = format!("{name}=");
    let value = raw
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))?;

    match urlencoding::decode(value) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(error) => {
            tracing::warn!(cookie = name, error = %error, "cookie value is not valid utf-8 once decoded");
            None
        }
    }
}

#[must_use]
pub fn csrf_token(raw: &str) -> Option<CsrfToken> {
    cookie_value(raw, CSRF_COOKIE_NAME).map(CsrfToken)
}
