//! What an error page shows.

use serde::Serialize;

/// The error pages the site can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Permission or cross-site request check failed.
    Forbidden,
    NotFound,
    TooManyRequests,
    ServerError,
}

impl ErrorKind {
    /// Every other status passes through without a page.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            403 => Some(ErrorKind::Forbidden),
            404 => Some(ErrorKind::NotFound),
            429 => Some(ErrorKind::TooManyRequests),
            500 => Some(ErrorKind::ServerError),
            _ => None,
        }
    }

    pub fn status(self) -> u16 {
        match self {
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::ServerError => 500,
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            ErrorKind::Forbidden => "pages/403csrf.html",
            ErrorKind::NotFound => "pages/404.html",
            ErrorKind::TooManyRequests => "pages/429.html",
            ErrorKind::ServerError => "pages/500.html",
        }
    }
}

/// Context of an error template.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPage {
    pub kind: ErrorKind,
    pub status: u16,
    /// The failed path.
    pub path: String,
    /// Shown to the visitor, so it must never carry internals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorPage {
    pub fn new(kind: ErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            status: kind.status(),
            path: path.into(),
            detail: None,
            request_id: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_retry_after(self, seconds: u64) -> Self {
        let unit = if seconds == 1 { "second" } else { "seconds" };
        self.with_detail(format!("Try again in {seconds} {unit}."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rendered_statuses_have_a_kind() {
        for kind in [
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::TooManyRequests,
            ErrorKind::ServerError,
        ] {
            assert_eq!(ErrorKind::from_status(kind.status()), Some(kind));
        }
        assert_eq!(ErrorKind::from_status(302), None);
        assert_eq!(ErrorKind::from_status(401), None);
    }

    #[test]
    fn test_retry_after_detail() {
        let page = ErrorPage::new(ErrorKind::TooManyRequests, "/auth/login/").with_retry_after(1);
        assert_eq!(page.detail.as_deref(), Some("Try again in 1 second."));
        assert_eq!(page.status, 429);
    }
}
