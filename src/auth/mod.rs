use crate::state::AppState;
use axum::Router;

pub mod csrf;
pub mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod sessions;

pub fn router() -> Router<AppState> {
    handlers::router()
}
