//! Session cookie handling and the viewer extractor.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use blogicum_core::policy::Viewer;
use blogicum_core::ports::IssuedToken;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "blogicum_session";

/// The viewer of the current request.
///
/// A missing, expired or tampered session cookie yields an anonymous
/// viewer, and so does a token whose account no longer exists. The
/// username always comes from the stored account. Only a failed account
/// lookup makes extraction fail.
/// ```ignore
/// async fn page(identity: Identity) -> impl Responder {
///     format!("Hello, {:?}!", identity.username())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity(Viewer);

impl Identity {
    pub fn into_inner(self) -> Viewer {
        self.0
    }

    async fn resolve(state: &AppState, token: &str) -> Result<Viewer, AppError> {
        let session = match state.sessions.verify(token) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session cookie");
                return Ok(Viewer::Anonymous);
            }
        };

        let account = state.users.find_by_id(session.user_id).await?;
        let viewer = session.viewer(account.as_ref());
        if viewer.username() != Some(session.username.as_str()) {
            tracing::debug!(
                user_id = session.user_id,
                token_username = %session.username,
                "Session token is stale"
            );
        }
        Ok(viewer)
    }
}

impl Deref for Identity {
    type Target = Viewer;

    fn deref(&self) -> &Viewer {
        &self.0
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(identity) = req.extensions().get::<Identity>() {
            let identity = identity.clone();
            return Box::pin(async move { Ok(identity) });
        }

        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let req = req.clone();

        Box::pin(async move {
            let viewer = match (token, state) {
                (None, _) => Viewer::Anonymous,
                (Some(_), None) => {
                    tracing::error!("AppState not found in app data");
                    Viewer::Anonymous
                }
                (Some(token), Some(state)) => Identity::resolve(&state, &token).await?,
            };

            let identity = Identity(viewer);
            req.extensions_mut().insert(identity.clone());
            Ok(identity)
        })
    }
}

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(issued: IssuedToken, secure: bool) -> Cookie<'static> {
    let max_age = Duration::seconds(issued.lifetime.num_seconds());
    Cookie::build(SESSION_COOKIE, issued.token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .finish()
}

/// Cookie that makes the browser drop the session.
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish();
    cookie.make_removal();
    cookie
}
