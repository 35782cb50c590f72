//! Comment submission, editing and deletion.

use actix_web::{HttpRequest, HttpResponse, web};

use blogicum_core::domain::{Comment, Id, Post};
use blogicum_core::error::DomainError;
use blogicum_core::forms::{CommentFormData, FormErrors, clean_comment};
use blogicum_core::policy::{MutationTarget, Viewer};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views;

/// What the comment page is being used for.
enum Mode<'a> {
    New,
    Edit(&'a Comment),
    Delete(&'a Comment),
}

/// GET /posts/{post_id}/comment/
pub async fn comment_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let post = find_post(&state, &viewer, path.into_inner()).await?;
    render(&state, &viewer, &post, Mode::New, &CommentFormData::default(), &FormErrors::new())
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
    form: web::Form<CommentFormData>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    let Some(author_id) = viewer.id() else {
        return Ok(views::login_redirect(req.path()));
    };

    let post = find_post(&state, &viewer, path.into_inner()).await?;
    let data = form.into_inner();
    let draft = match clean_comment(&data) {
        Ok(draft) => draft,
        Err(errors) => return render(&state, &viewer, &post, Mode::New, &data, &errors),
    };

    let comment = state
        .comments
        .save(Comment::new(post.id, author_id, draft.text))
        .await?;
    tracing::info!(comment_id = comment.id, post_id = post.id, author_id, "Comment added");

    Ok(views::redirect(&views::post_url(post.id)))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let (post_id, comment_id) = path.into_inner();
    let (post, comment) = find_comment(&state, &viewer, post_id, comment_id).await?;
    if let Some(refusal) =
        views::refuse_unless_owner(&req, &viewer, MutationTarget::Comment(&comment))
    {
        return Ok(refusal);
    }

    let form = CommentFormData {
        text: comment.text.clone(),
    };
    render(&state, &viewer, &post, Mode::Edit(&comment), &form, &FormErrors::new())
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
    form: web::Form<CommentFormData>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let (post_id, comment_id) = path.into_inner();
    let (post, mut comment) = find_comment(&state, &viewer, post_id, comment_id).await?;
    if let Some(refusal) =
        views::refuse_unless_owner(&req, &viewer, MutationTarget::Comment(&comment))
    {
        return Ok(refusal);
    }

    let data = form.into_inner();
    let draft = match clean_comment(&data) {
        Ok(draft) => draft,
        Err(errors) => return render(&state, &viewer, &post, Mode::Edit(&comment), &data, &errors),
    };

    comment.text = draft.text;
    let comment = state.comments.save(comment).await?;
    tracing::info!(comment_id = comment.id, post_id, "Comment updated");

    Ok(views::redirect(&views::post_url(post.id)))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let (post_id, comment_id) = path.into_inner();
    let (post, comment) = find_comment(&state, &viewer, post_id, comment_id).await?;
    if let Some(refusal) =
        views::refuse_unless_owner(&req, &viewer, MutationTarget::Comment(&comment))
    {
        return Ok(refusal);
    }

    let form = CommentFormData {
        text: comment.text.clone(),
    };
    render(&state, &viewer, &post, Mode::Delete(&comment), &form, &FormErrors::new())
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
) -> AppResult<HttpResponse> {
    let viewer = identity.into_inner();
    if !viewer.is_authenticated() {
        return Ok(views::login_redirect(req.path()));
    }

    let (post_id, comment_id) = path.into_inner();
    let (post, comment) = find_comment(&state, &viewer, post_id, comment_id).await?;
    if let Some(refusal) =
        views::refuse_unless_owner(&req, &viewer, MutationTarget::Comment(&comment))
    {
        return Ok(refusal);
    }

    state.comments.delete(comment.id).await?;
    tracing::info!(comment_id, post_id, "Comment deleted");

    Ok(views::redirect(&views::post_url(post.id)))
}

/// A post the viewer may read; hidden posts are not found.
async fn find_post(state: &AppState, viewer: &Viewer, id: Id) -> AppResult<Post> {
    Ok(views::find_visible_post(state, viewer, id).await?.post)
}

/// The comment, provided it hangs off a post the viewer may read and that
/// post is the one named in the URL.
async fn find_comment(
    state: &AppState,
    viewer: &Viewer,
    post_id: Id,
    comment_id: Id,
) -> AppResult<(Post, Comment)> {
    let post = find_post(state, viewer, post_id).await?;
    let comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|comment| comment.post_id == post.id)
        .ok_or_else(|| DomainError::not_found("comment", comment_id))?;
    Ok((post, comment))
}

fn render(
    state: &AppState,
    viewer: &Viewer,
    post: &Post,
    mode: Mode<'_>,
    form: &CommentFormData,
    errors: &FormErrors,
) -> AppResult<HttpResponse> {
    let (comment, deleting) = match mode {
        Mode::New => (None, false),
        Mode::Edit(comment) => (Some(comment), false),
        Mode::Delete(comment) => (Some(comment), true),
    };

    let mut ctx = views::context(viewer);
    ctx.insert("post", post);
    ctx.insert("comment", &comment);
    ctx.insert("deleting", &deleting);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    views::render(state, "blog/comment.html", &ctx)
}
