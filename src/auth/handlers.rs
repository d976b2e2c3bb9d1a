use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, SessionResponse},
        extractors::DashboardSession,
        services::SessionKeys,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let ok = match state.gate.check_password(&payload.password) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "check_password failed");
            return Err(AppError::Unauthorized("Invalid password. Please try again.".into()));
        }
    };
    if !ok {
        warn!("dashboard login with wrong password");
        return Err(AppError::Unauthorized("Invalid password. Please try again.".into()));
    }

    let keys = SessionKeys::from_ref(&state);
    let (token, claims) = keys.sign().map_err(|e| {
        error!(error = %e, "session sign failed");
        AppError::Unauthorized("could not start a session".into())
    })?;
    let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp as i64)
        .unwrap_or_else(|_| OffsetDateTime::now_utc());

    info!(sid = %claims.sid, "dashboard session started");
    Ok(Json(SessionResponse {
        token,
        expires_at,
        message: "Login successful! Redirecting to dashboard...",
    }))
}

#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    DashboardSession(session): DashboardSession,
) -> StatusCode {
    state.gate.revoke(&session).await;
    info!(sid = %session.sid, "dashboard session ended");
    StatusCode::NO_CONTENT
}
