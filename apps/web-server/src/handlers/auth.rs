//! Sign-up, login and logout.

use actix_web::{HttpResponse, web};

use blogicum_core::domain::User;
use blogicum_core::error::RepoError;
use blogicum_core::forms::{
    FormErrors, LoginFormData, NON_FIELD_ERRORS, RegistrationFormData, clean_login,
    clean_registration,
};
use blogicum_core::policy::Viewer;
use blogicum_shared::dto::NextQuery;

use crate::middleware::auth::{Identity, cleared_session_cookie, session_cookie};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views;

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// GET /auth/registration/
pub async fn registration_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    render_registration(
        &state,
        &identity,
        &RegistrationFormData::default(),
        &FormErrors::new(),
    )
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<RegistrationFormData>,
) -> AppResult<HttpResponse> {
    let data = form.into_inner();
    let registration = match clean_registration(&data) {
        Ok(registration) => registration,
        Err(errors) => return render_registration(&state, &identity, &data, &errors),
    };

    if state
        .users
        .find_by_username(&registration.username)
        .await?
        .is_some()
    {
        let mut errors = FormErrors::new();
        errors.add("username", USERNAME_TAKEN);
        return render_registration(&state, &identity, &data, &errors);
    }

    let password_hash = state.passwords.hash(&registration.password)?;
    let user = User::new(registration.username, registration.email, password_hash);
    let user = match state.users.save(user).await {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            return render_registration(&state, &identity, &data, &errors);
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(views::redirect(views::LOGIN_URL))
}

/// GET /auth/login/
pub async fn login_form(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    render_login(
        &state,
        &identity,
        &LoginFormData::default(),
        &FormErrors::new(),
        query.next.as_deref(),
    )
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<NextQuery>,
    form: web::Form<LoginFormData>,
) -> AppResult<HttpResponse> {
    let next = query.next.as_deref();
    let data = form.into_inner();
    let credentials = match clean_login(&data) {
        Ok(credentials) => credentials,
        Err(errors) => return render_login(&state, &identity, &data, &errors, next),
    };

    let user = state.users.find_by_username(&credentials.username).await?;
    let verified = match &user {
        Some(user) => state
            .passwords
            .verify(&credentials.password, &user.password_hash)
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = user.id, error = %e, "Stored password hash is unusable");
                false
            }),
        None => {
            state.passwords.verify_decoy(&credentials.password);
            false
        }
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::info!(username = %credentials.username, "Failed login attempt");
        let mut errors = FormErrors::new();
        errors.add(NON_FIELD_ERRORS, BAD_CREDENTIALS);
        return render_login(&state, &identity, &data, &errors, next);
    };

    let issued = state.sessions.issue(user.id, &user.username)?;
    tracing::info!(user_id = user.id, "User logged in");

    let location = match next {
        Some(next) if views::is_safe_next(next) => next.to_string(),
        _ => views::profile_url(&user.username),
    };
    let cookie = session_cookie(issued, state.session.cookie_secure);
    Ok(views::redirect_with_cookie(&location, cookie))
}

/// POST /auth/logout/
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> HttpResponse {
    if let Some(user_id) = identity.id() {
        tracing::info!(user_id, "User logged out");
    }
    views::redirect_with_cookie(
        views::INDEX_URL,
        cleared_session_cookie(state.session.cookie_secure),
    )
}

fn render_registration(
    state: &AppState,
    viewer: &Viewer,
    form: &RegistrationFormData,
    errors: &FormErrors,
) -> AppResult<HttpResponse> {
    let mut ctx = views::context(viewer);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    views::render(state, "registration/registration_form.html", &ctx)
}

fn render_login(
    state: &AppState,
    viewer: &Viewer,
    form: &LoginFormData,
    errors: &FormErrors,
    next: Option<&str>,
) -> AppResult<HttpResponse> {
    let mut ctx = views::context(viewer);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("next", &next.filter(|next| views::is_safe_next(next)));
    views::render(state, "registration/login.html", &ctx)
}
