//! Profile page and profile editing.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use blogicum_core::domain::User;
use blogicum_core::error::{DomainError, RepoError};
use blogicum_core::forms::{FormErrors, ProfileFormData, clean_profile, profile_initial};
use blogicum_core::policy::{ListingScope, MutationTarget, PostQuery, PostVisibility, Viewer};
use blogicum_shared::dto::PageQuery;

use crate::middleware::auth::{Identity, session_cookie};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = views::page_request(query.page.as_deref(), state.pagination.profile_per_page)?;
    let viewer = identity.into_inner();
    let owner = find_user(&state, &path).await?;

    let query = PostQuery::new(
        ListingScope::Profile(owner.id),
        PostVisibility::for_profile(&viewer, &owner),
        Utc::now(),
    );
    let page = views::load_page(&state, &query, request).await?;

    let mut ctx = views::context(&viewer);
    ctx.insert("profile", &owner.profile());
    ctx.insert("page_obj", &page);
    views::render(&state, "blog/profile.html", &ctx)
}

/// GET /profile/{username}/edit/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let user = find_user(&state, &path).await?;
    if let Some(refusal) = views::refuse_unless_owner(&req, &viewer, MutationTarget::Profile(&user))
    {
        return Ok(refusal);
    }

    render_form(&state, &viewer, &profile_initial(&user), &FormErrors::new())
}

/// POST /profile/{username}/edit/
pub async fn edit(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    form: web::Form<ProfileFormData>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let mut user = find_user(&state, &path).await?;
    if let Some(refusal) = views::refuse_unless_owner(&req, &viewer, MutationTarget::Profile(&user))
    {
        return Ok(refusal);
    }

    let data = form.into_inner();
    let changes = match clean_profile(&data) {
        Ok(changes) => changes,
        Err(errors) => return render_form(&state, &viewer, &data, &errors),
    };

    if changes.username != user.username {
        if let Some(other) = state.users.find_by_username(&changes.username).await? {
            if other.id != user.id {
                let mut errors = FormErrors::new();
                errors.add("username", USERNAME_TAKEN);
                return render_form(&state, &viewer, &data, &errors);
            }
        }
    }

    changes.apply_to(&mut user);
    let user = match state.users.save(user).await {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", USERNAME_TAKEN);
            return render_form(&state, &viewer, &data, &errors);
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = user.id, username = %user.username, "Profile updated");

    // The session token carries the username, so it is re-issued.
    let issued = state.sessions.issue(user.id, &user.username)?;
    let cookie = session_cookie(issued, state.session.cookie_secure);
    Ok(views::redirect_with_cookie(&views::profile_url(&user.username), cookie))
}

async fn find_user(state: &AppState, username: &str) -> AppResult<User> {
    state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| DomainError::not_found("user", username).into())
}

fn render_form(
    state: &AppState,
    viewer: &Viewer,
    form: &ProfileFormData,
    errors: &FormErrors,
) -> AppResult<HttpResponse> {
    let mut ctx = views::context(viewer);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    views::render(state, "blog/user.html", &ctx)
}
