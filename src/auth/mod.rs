use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
mod password;
pub mod services;

pub use extractors::DashboardSession;
pub use services::DashboardGate;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
