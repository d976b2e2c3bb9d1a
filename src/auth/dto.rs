use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Request body for the dashboard login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Response after a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub message: &'static str,
}
