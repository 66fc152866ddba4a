use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{PostPayload, PostView},
    repo::Post,
};
use crate::{
    auth::{guard::ensure_owner, jwt::AuthUser},
    comments::{dto::CommentView, repo::Comment},
    error::ApiError,
    extract::{JsonBody, Pagination, QueryParams, ResourceId},
    responses::{message, Created, Message},
    state::AppState,
    validation::Validate,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/comments", get(list_post_comments))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    JsonBody(payload): JsonBody<PostPayload>,
) -> Result<Created<PostView>, ApiError> {
    let payload = payload.prepare()?;
    ensure_owner(caller, payload.author_id)?;

    let post = Post::create(&state.db, &payload.title, &payload.content, payload.author_id).await?;

    info!(post_id = post.id, author_id = post.author_id, "post created");
    Ok(Created::at(format!("/api/posts/{}", post.id), post.into()))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    QueryParams(p): QueryParams<Pagination>,
) -> Result<Json<Vec<PostView>>, ApiError> {
    let (limit, offset) = p.bounds();
    let posts = Post::list(&state.db, limit, offset).await?;
    Ok(Json(posts.into_iter().map(PostView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<PostView>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;
    Ok(Json(post.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AuthUser(caller): AuthUser,
    JsonBody(payload): JsonBody<PostPayload>,
) -> Result<Json<PostView>, ApiError> {
    let existing = Post::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;
    ensure_owner(caller, existing.author_id)?;
    // The payload may not hand the post to someone else.
    ensure_owner(caller, payload.author_id)?;

    let payload = payload.prepare()?;
    let post = Post::update(&state.db, id, &payload.title, &payload.content)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    info!(post_id = post.id, "post updated");
    Ok(Json(post.into()))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AuthUser(caller): AuthUser,
) -> Result<Json<Message>, ApiError> {
    let existing = Post::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;
    ensure_owner(caller, existing.author_id)?;

    if !Post::delete_with_comments(&state.db, id).await? {
        return Err(ApiError::not_found("Post"));
    }

    info!(post_id = id, "post deleted");
    Ok(message("Post has been deleted"))
}

#[instrument(skip(state))]
pub async fn list_post_comments(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    Post::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    let comments = Comment::list_by_post(&state.db, id).await?;
    Ok(Json(comments.into_iter().map(CommentView::from).collect()))
}
