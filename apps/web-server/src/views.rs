//! Rendering and redirect helpers shared by the handlers.

use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponse, http::header};
use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tera::Context;

use blogicum_core::domain::{Id, PostSummary};
use blogicum_core::error::DomainError;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::policy::{Access, Fallback, MutationTarget, PostQuery, PostVisibility, Viewer, authorize};

use crate::middleware::error::AppResult;
use crate::state::AppState;

pub fn post_url(id: Id) -> String {
    format!("/posts/{id}/")
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

pub const INDEX_URL: &str = "/";
pub const LOGIN_URL: &str = "/auth/login/";

/// Unreserved characters and `/` stay readable in a `?next=` value.
const NEXT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// A template context with the navigation data every page uses.
pub fn context(viewer: &Viewer) -> Context {
    let mut ctx = Context::new();
    ctx.insert("viewer", &viewer.username());
    ctx
}

pub fn render(state: &AppState, template: &str, ctx: &Context) -> AppResult<HttpResponse> {
    let body = state.templates.render(template, ctx)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// `302 Found` that also sets or clears a cookie.
pub fn redirect_with_cookie(location: &str, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}

/// Send an anonymous viewer to the login page, coming back to `next`.
pub fn login_redirect(next: &str) -> HttpResponse {
    redirect(&format!("{LOGIN_URL}?next={}", utf8_percent_encode(next, NEXT_VALUE)))
}

/// Local paths only: `/x` is fine, `//host/x` and absolute URLs are not.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

fn fallback_url(fallback: &Fallback) -> String {
    match fallback {
        Fallback::PostDetail(id) => post_url(*id),
        Fallback::Profile(username) => profile_url(username),
    }
}

/// Run the ownership check. `Some` carries the redirect that replaces the
/// handler's response.
pub fn refuse_unless_owner(
    req: &HttpRequest,
    viewer: &Viewer,
    target: MutationTarget<'_>,
) -> Option<HttpResponse> {
    match authorize(viewer, target) {
        Access::Granted => None,
        Access::Login => Some(login_redirect(req.path())),
        Access::Denied(fallback) => {
            tracing::debug!(
                kind = target.kind(),
                viewer = viewer.username().unwrap_or_default(),
                "Mutation refused"
            );
            Some(redirect(&fallback_url(&fallback)))
        }
    }
}

/// Parse `?page=`; anything unusable is a 404.
pub fn page_request(raw: Option<&str>, per_page: u64) -> AppResult<PageRequest> {
    PageRequest::parse(raw, per_page)
        .ok_or_else(|| DomainError::InvalidPage(raw.unwrap_or_default().to_string()).into())
}

/// One page of a listing; pages past the end are a 404.
pub async fn load_page(
    state: &AppState,
    query: &PostQuery,
    request: PageRequest,
) -> AppResult<Page<PostSummary>> {
    let page = state.posts.list(query, request).await?;
    if page.is_out_of_range() {
        return Err(DomainError::PageOutOfRange {
            page: page.number,
            last: page.num_pages,
        }
        .into());
    }
    Ok(page)
}

/// A post the viewer is allowed to read.
pub async fn find_visible_post(state: &AppState, viewer: &Viewer, id: Id) -> AppResult<PostSummary> {
    let summary = state
        .posts
        .find_summary(id)
        .await?
        .ok_or_else(|| DomainError::not_found("post", id))?;

    if !PostVisibility::for_viewer(viewer).admits(&summary.post, &summary.category, Utc::now()) {
        return Err(DomainError::not_found("post", id).into());
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_must_be_local() {
        assert!(is_safe_next("/posts/1/edit/"));
        assert!(!is_safe_next("//evil.example/"));
        assert!(!is_safe_next("https://evil.example/"));
        assert!(!is_safe_next("/\\evil.example"));
    }

    #[test]
    fn test_login_redirect_encodes_next() {
        let response = login_redirect("/profile/a+b/edit/");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/profile/a%2Bb/edit/"
        );
    }

    #[test]
    fn test_login_redirect_encodes_query_and_unicode() {
        let response = login_redirect("/search/?q=a b&x=ё");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/search/%3Fq%3Da%20b%26x%3D%D1%91"
        );
    }
}
