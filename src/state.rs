use std::sync::Arc;

use anyhow::Context;

use crate::analytics::VisitCounter;
use crate::auth::DashboardGate;
use crate::candidates::CandidateStore;
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, StorageBackend};
use crate::storage::{KeyValueStore, MemoryKeyValueStore, PgKeyValueStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub candidates: Arc<CandidateStore>,
    pub visits: Arc<VisitCounter>,
    pub gate: Arc<DashboardGate>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let kv: Arc<dyn KeyValueStore> = match config.backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL missing")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgKeyValueStore::new(db))
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage; candidates are lost on restart");
                Arc::new(MemoryKeyValueStore::new())
            }
        };

        Self::from_parts(config, kv, Arc::new(SystemClock)).await
    }

    pub async fn from_parts(
        config: Arc<AppConfig>,
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let candidates = CandidateStore::load(kv.clone(), clock, config.keys.candidates.clone())
            .await
            .context("load candidates")?;
        let visits = VisitCounter::new(kv, config.keys.visits.clone());
        let gate = DashboardGate::new(&config.dashboard_password)?;

        Ok(Self {
            config,
            candidates: Arc::new(candidates),
            visits: Arc::new(visits),
            gate: Arc::new(gate),
        })
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub async fn fake() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(SystemClock),
        )
        .await
        .expect("fake state")
    }
}
