use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod migrate;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::CandidateStore;
pub use repo_types::{Candidate, CandidateDraft};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::public_routes())
}
