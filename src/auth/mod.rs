use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
