use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{claims::SessionClaims, services::SessionKeys};
use crate::{error::AppError, state::AppState};

/// A live dashboard session taken from `Authorization: Bearer <token>`.
pub struct DashboardSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for DashboardSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("You need to login to access the dashboard.".into())
            })?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))?;

        let keys = SessionKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired session token");
            AppError::Unauthorized("invalid or expired session".into())
        })?;

        if state.gate.is_revoked(&claims.sid).await {
            return Err(AppError::Unauthorized("session has been logged out".into()));
        }

        Ok(DashboardSession(claims))
    }
}
