use crate::state::AppState;
use axum::Router;

pub mod cities;
mod dto;
pub mod handlers;
pub mod projector;
pub mod stats;

pub fn router() -> Router<AppState> {
    handlers::dashboard_routes()
}
