//! Post listings, detail page and the post create/edit/delete forms.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use blogicum_core::domain::{Id, Post};
use blogicum_core::error::DomainError;
use blogicum_core::forms::{
    CommentFormData, FormErrors, PostDraft, PostFormData, clean_post, post_initial,
};
use blogicum_core::policy::{ListingScope, MutationTarget, PostQuery, PostVisibility, Viewer};
use blogicum_shared::dto::PageQuery;

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = views::page_request(query.page.as_deref(), state.pagination.posts_per_page)?;
    let viewer = identity.into_inner();

    let query = PostQuery::new(ListingScope::Index, PostVisibility::PUBLIC, Utc::now());
    let page = views::load_page(&state, &query, request).await?;

    let mut ctx = views::context(&viewer);
    ctx.insert("page_obj", &page);
    views::render(&state, "blog/index.html", &ctx)
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let request = views::page_request(query.page.as_deref(), state.pagination.category_per_page)?;
    let viewer = identity.into_inner();

    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|category| category.is_published)
        .ok_or_else(|| DomainError::not_found("category", &slug))?;

    let query = PostQuery::new(
        ListingScope::Category(category.id),
        PostVisibility::for_viewer(&viewer),
        Utc::now(),
    );
    let page = views::load_page(&state, &query, request).await?;

    let mut ctx = views::context(&viewer);
    ctx.insert("category", &category);
    ctx.insert("page_obj", &page);
    views::render(&state, "blog/category.html", &ctx)
}

/// GET /posts/{post_id}/
pub async fn detail(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let viewer = identity.into_inner();

    let summary = views::find_visible_post(&state, &viewer, post_id).await?;
    let comments = state.comments.list_for_post(post_id).await?;

    let mut ctx = views::context(&viewer);
    ctx.insert("summary", &summary);
    ctx.insert("comments", &comments);
    ctx.insert("form", &CommentFormData::default());
    ctx.insert("errors", &FormErrors::new());
    views::render(&state, "blog/detail.html", &ctx)
}

/// GET /posts/create/
pub async fn create_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    render_form(&state, &viewer, &PostFormData::default(), &FormErrors::new(), None).await
}

/// POST /posts/create/
pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    let Viewer::User { id: author_id, username } = &viewer else {
        return Ok(views::login_redirect(req.path()));
    };

    let data = form.into_inner();
    let draft = match validate(&state, &data).await? {
        Ok(draft) => draft,
        Err(errors) => return render_form(&state, &viewer, &data, &errors, None).await,
    };

    let post = Post::new(
        *author_id,
        draft.title,
        draft.text,
        draft.pub_date,
        draft.category_id,
        draft.location_id,
    );
    let post = state.posts.save(post).await?;
    tracing::info!(post_id = post.id, author_id, "Post created");

    Ok(views::redirect(&views::profile_url(username)))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = views::refuse_unless_owner(&req, &viewer, MutationTarget::Post(&post)) {
        return Ok(refusal);
    }

    render_form(&state, &viewer, &post_initial(&post), &FormErrors::new(), Some(&post)).await
}

/// POST /posts/{post_id}/edit/
pub async fn edit(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
    form: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let mut post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = views::refuse_unless_owner(&req, &viewer, MutationTarget::Post(&post)) {
        return Ok(refusal);
    }

    let data = form.into_inner();
    let draft = match validate(&state, &data).await? {
        Ok(draft) => draft,
        Err(errors) => return render_form(&state, &viewer, &data, &errors, Some(&post)).await,
    };

    draft.apply_to(&mut post);
    let post = state.posts.save(post).await?;
    tracing::info!(post_id = post.id, "Post updated");

    Ok(views::redirect(&views::post_url(post.id)))
}

/// GET /posts/{post_id}/delete/
pub async fn delete_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = views::refuse_unless_owner(&req, &viewer, MutationTarget::Post(&post)) {
        return Ok(refusal);
    }

    let mut ctx = views::context(&viewer);
    ctx.insert("post", &post);
    views::render(&state, "blog/post_confirm_delete.html", &ctx)
}

/// POST /posts/{post_id}/delete/
pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = views::refuse_unless_owner(&req, &viewer, MutationTarget::Post(&post)) {
        return Ok(refusal);
    }

    state.posts.delete(post.id).await?;
    tracing::info!(post_id = post.id, "Post deleted");

    Ok(views::redirect(views::INDEX_URL))
}

async fn find_post(state: &AppState, id: Id) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("post", id).into())
}

/// Form validation plus the checks that need storage.
async fn validate(state: &AppState, data: &PostFormData) -> AppResult<Result<PostDraft, FormErrors>> {
    let draft = match clean_post(data) {
        Ok(draft) => draft,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut errors = FormErrors::new();
    if state.categories.find_by_id(draft.category_id).await?.is_none() {
        errors.add(
            "category",
            "Select a valid choice. That choice is not one of the available choices.",
        );
    }
    if let Some(location_id) = draft.location_id {
        if state.locations.find_by_id(location_id).await?.is_none() {
            errors.add(
                "location",
                "Select a valid choice. That choice is not one of the available choices.",
            );
        }
    }

    Ok(errors.into_result(draft))
}

async fn render_form(
    state: &AppState,
    viewer: &Viewer,
    form: &PostFormData,
    errors: &FormErrors,
    post: Option<&Post>,
) -> AppResult<HttpResponse> {
    let categories = state.categories.list_all().await?;
    let locations = state.locations.list_published().await?;

    let mut ctx = views::context(viewer);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("categories", &categories);
    ctx.insert("locations", &locations);
    ctx.insert("post", &post);
    views::render(state, "blog/post_form.html", &ctx)
}
