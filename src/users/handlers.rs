use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{PublicUser, UserPayload},
    repo::User,
};
use crate::{
    auth::{guard::ensure_owner, jwt::AuthUser, password::hash_password},
    error::ApiError,
    extract::{JsonBody, Pagination, QueryParams, ResourceId},
    responses::{message, Created, Message},
    state::AppState,
    validation::Validate,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<Created<PublicUser>, ApiError> {
    let payload = payload.prepare()?;
    let hash = hash_password(&payload.password)?;

    let user = User::create(&state.db, &payload.username, &payload.email, &hash).await?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok(Created::at(format!("/api/users/{}", user.id), user.into()))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(p): QueryParams<Pagination>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let (limit, offset) = p.bounds();
    let users = User::list(&state.db, limit, offset).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AuthUser(caller): AuthUser,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<Json<PublicUser>, ApiError> {
    ensure_owner(caller, id)?;
    let payload = payload.prepare()?;
    let hash = hash_password(&payload.password)?;

    let user = User::update(&state.db, id, &payload.username, &payload.email, &hash)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    info!(user_id = user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    AuthUser(caller): AuthUser,
) -> Result<Json<Message>, ApiError> {
    ensure_owner(caller, id)?;

    if !User::delete_cascade(&state.db, id).await? {
        return Err(ApiError::not_found("User"));
    }

    info!(user_id = id, "user deleted with posts and comments");
    Ok(message("User has been deleted"))
}
