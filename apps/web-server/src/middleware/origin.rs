//! Cross-site form submission guard.
//!
//! Browsers attach `Origin` to form posts, and `Referer` unless a referrer
//! policy strips it. A state-changing request whose origin (or, without
//! `Origin`, whose referer) names another host is refused with 403 before
//! it reaches a handler. A request carrying neither header passes; for
//! those, the `SameSite=Lax` session cookie is the only cross-site check.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, header},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;

/// Middleware factory for the same-origin check.
pub struct SameOriginGuard;

impl<S, B> Transform<S, ServiceRequest> for SameOriginGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SameOriginService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SameOriginService { service }))
    }
}

pub struct SameOriginService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for SameOriginService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let safe_method = matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS);
        let header_value = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let origin = header_value(header::ORIGIN).or_else(|| header_value(header::REFERER));

        if let Some(origin) = origin.filter(|_| !safe_method) {
            let host = req.connection_info().host().to_owned();
            if !same_host(&origin, &host) {
                tracing::warn!(origin = %origin, host = %host, "Cross-site submission refused");
                let response = req.into_response(HttpResponse::Forbidden().finish());
                return Box::pin(async move { Ok(response.map_into_right_body()) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Whether an `Origin` value (`scheme://host[:port]`) or a `Referer` URL
/// points at `host`.
fn same_host(origin: &str, host: &str) -> bool {
    origin.split_once("://").is_some_and(|(_, rest)| {
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        authority.eq_ignore_ascii_case(host)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_host_matches_authority() {
        assert!(same_host("http://localhost:8080", "localhost:8080"));
        assert!(same_host("https://Blog.Example", "blog.example"));
    }

    #[test]
    fn test_foreign_or_opaque_origin_rejected() {
        assert!(!same_host("https://evil.example", "blog.example"));
        assert!(!same_host("null", "blog.example"));
        assert!(!same_host("http://localhost:9000", "localhost:8080"));
    }

    #[test]
    fn test_referer_url_matches_by_authority() {
        assert!(same_host("http://localhost:8080/posts/1/?page=2", "localhost:8080"));
        assert!(same_host("https://blog.example?x=1", "blog.example"));
        assert!(!same_host("https://evil.example/blog.example", "blog.example"));
    }
}
