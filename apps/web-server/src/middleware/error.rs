//! Application errors and the HTML error pages they render as.

use actix_web::{
    HttpMessage, HttpResponse, ResponseError,
    dev::ServiceResponse,
    http::{StatusCode, header},
    middleware::{ErrorHandlerResponse, ErrorHandlers},
    web,
};
use blogicum_core::error::{DomainError, RepoError};
use blogicum_core::ports::AuthError;
use blogicum_shared::{ErrorKind, ErrorPage};

use crate::observability::RequestId;
use crate::state::AppState;

/// Application-level error type. The body is filled in by [`error_handlers`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = self {
            tracing::error!("Internal error: {}", detail);
        }
        HttpResponse::build(self.status_code()).finish()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => {
                tracing::error!("Database constraint violation: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::Internal(format!("template rendering failed: {err:?}"))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Replace the body of 403, 404, 429 and 500 responses with their page.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    [
        StatusCode::FORBIDDEN,
        StatusCode::NOT_FOUND,
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::INTERNAL_SERVER_ERROR,
    ]
    .into_iter()
    .fold(ErrorHandlers::new(), |handlers, status| {
        handlers.handler(status, render_error_page)
    })
}

fn describe<B>(res: &ServiceResponse<B>, kind: ErrorKind) -> ErrorPage {
    let mut page = ErrorPage::new(kind, res.request().path());

    if kind == ErrorKind::TooManyRequests {
        let retry_after = res
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        page = page.with_retry_after(retry_after);
    }

    // Only not-found details are safe to show.
    if let Some(AppError::NotFound(detail)) =
        res.response().error().and_then(|e| e.as_error::<AppError>())
    {
        page = page.with_detail(detail.clone());
    }

    match res.request().extensions().get::<RequestId>() {
        Some(id) => page.with_request_id(id.as_str()),
        None => page,
    }
}

fn render_error_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let Some(kind) = ErrorKind::from_status(res.status().as_u16()) else {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    };
    let page = describe(&res, kind);
    let template = kind.template();

    let body = res
        .request()
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| "application state missing".to_string())
        .and_then(|state| {
            let mut ctx = tera::Context::new();
            ctx.insert("viewer", &Option::<String>::None);
            ctx.insert("error", &page);
            state
                .templates
                .render(template, &ctx)
                .map_err(|e| format!("{e:?}"))
        })
        .unwrap_or_else(|e| {
            tracing::error!(template, error = %e, "Failed to render error page");
            format!("{} {}", page.status, res.status().canonical_reason().unwrap_or("Error"))
        });

    let (req, mut res) = res.into_parts();
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/html; charset=utf-8"),
    );
    let res = ServiceResponse::new(req, res.set_body(body))
        .map_into_boxed_body()
        .map_into_right_body();

    Ok(ErrorHandlerResponse::Response(res))
}
