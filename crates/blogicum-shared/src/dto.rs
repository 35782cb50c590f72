//! Data Transfer Objects - query strings of the HTML pages.

use serde::Deserialize;

/// `?page=` on listing pages. Kept as a string so that garbage maps to 404.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?next=` on the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}
