//! Liveness check.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::observability::RequestId;
use crate::state::{AppState, Storage};

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    storage: Storage,
    checked_at: DateTime<Utc>,
    request_id: String,
}

/// GET /health
pub async fn health_check(state: web::Data<AppState>, request_id: RequestId) -> HttpResponse {
    HttpResponse::Ok().json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
        checked_at: Utc::now(),
        request_id: request_id.to_string(),
    })
}
