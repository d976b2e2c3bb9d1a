use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a session token unlocks. Only the dashboard exists today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[serde(alias = "Dashboard")]
    Dashboard,
}

/// JWT payload of a dashboard session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,        // session ID, used for logout
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
    pub kind: SessionKind,
}
