//! Static pages.

use actix_web::{HttpResponse, web};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views;

/// GET /pages/about/
pub async fn about(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    views::render(&state, "pages/about.html", &views::context(&identity))
}

/// GET /pages/rules/
pub async fn rules(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    views::render(&state, "pages/rules.html", &views::context(&identity))
}
