use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::{error::AppResult, state::AppState, storage::KeyValueStore};

/// Page-visit counter kept as plain integer text under its own key.
pub struct VisitCounter {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    // serializes read-modify-write
    write: Mutex<()>,
}

impl VisitCounter {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            write: Mutex::new(()),
        }
    }

    /// Missing or unparsable values count as zero.
    pub async fn visits_count(&self) -> AppResult<u64> {
        let raw = self.kv.get(&self.key).await?;
        Ok(match raw {
            None => 0,
            Some(v) => v.trim().parse().unwrap_or_else(|_| {
                warn!(key = %self.key, value = %v, "visit counter unparsable; treating as 0");
                0
            }),
        })
    }

    pub async fn increment_visits(&self) -> AppResult<u64> {
        let _guard = self.write.lock().await;
        let next = self.visits_count().await? + 1;
        self.kv.set(&self.key, &next.to_string()).await?;
        debug!(visits = next, "visit recorded");
        Ok(next)
    }
}

#[derive(Debug, Serialize)]
pub struct VisitsResponse {
    pub visits: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/analytics/visits", post(record_visit))
}

#[instrument(skip(state))]
pub async fn record_visit(State(state): State<AppState>) -> AppResult<Json<VisitsResponse>> {
    let visits = state.visits.increment_visits().await?;
    Ok(Json(VisitsResponse { visits }))
}
