mod analytics;
mod app;
mod auth;
mod candidates;
mod clock;
mod config;
mod dashboard;
mod error;
mod state;
mod storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "candidate_portal=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    tracing::info!(
        candidates = app_state.candidates.list().await.len(),
        backend = ?app_state.config.backend,
        "state ready"
    );

    let mut changes = app_state.candidates.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let count = changes.borrow_and_update().len();
            tracing::debug!(count, "candidate collection changed");
        }
    });

    app::serve(app::build_app(app_state)).await
}
