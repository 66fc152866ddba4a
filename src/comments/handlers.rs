use axum::{extract::State, routing::{post, put}, Json, Router};
use tracing::{info, instrument, warn};

use super::{
    dto::{CommentEdit, CommentView, NewComment},
    repo::Comment,
};
use crate::{
    auth::{guard::ensure_owner, jwt::AuthUser},
    error::ApiError,
    extract::{JsonBody, ResourceId},
    posts::repo::Post,
    responses::{message, Created, Message},
    state::AppState,
    users::repo::User,
    validation::Validate,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(create_comment))
        .route("/comments/:id", put(update_comment).delete(delete_comment))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    JsonBody(payload): JsonBody<NewComment>,
) -> Result<Created<CommentView>, ApiError> {
    let payload = payload.prepare()?;

    if User::find_by_id(&state.db, caller).await?.is_none() {
        warn!(user_id = caller, "token for a user that no longer exists");
        return Err(ApiError::unauthorized());
    }
    Post::find_by_id(&state.db, payload.post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    let comment = Comment::create(&state.db, caller, payload.post_id, &payload.body).await?;

    info!(comment_id = comment.id, post_id = comment.post_id, "comment created");
    Ok(Created::at(format!("/api/comments/{}", comment.id), comment.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_comment(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AuthUser(caller): AuthUser,
    JsonBody(payload): JsonBody<CommentEdit>,
) -> Result<Json<CommentView>, ApiError> {
    let existing = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    ensure_owner(caller, existing.user_id)?;

    let payload = payload.prepare()?;
    let comment = Comment::update(&state.db, id, &payload.body)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    info!(comment_id = comment.id, "comment updated");
    Ok(Json(comment.into()))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AuthUser(caller): AuthUser,
) -> Result<Json<Message>, ApiError> {
    let existing = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    ensure_owner(caller, existing.user_id)?;

    if !Comment::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Comment"));
    }

    info!(comment_id = id, "comment deleted");
    Ok(message("Comment has been deleted"))
}
