//! Fake login gate for the dashboard.
//!
//! One shared secret from configuration unlocks the dashboard for the
//! lifetime of a session token. This is a UI capability flag and provides
//! no real protection: anyone who knows the secret is "authorized", and
//! there are no users.

use std::{collections::HashMap, time::Duration};

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{
    claims::{SessionClaims, SessionKind},
    password::{hash_password, verify_password},
};
use crate::{config::SessionConfig, state::AppState};

/// Signing material for session tokens, derived from config on demand.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl SessionKeys {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    /// Issues a fresh dashboard token.
    pub fn sign(&self) -> anyhow::Result<(String, SessionClaims)> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            sid: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: SessionKind::Dashboard,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(sid = %claims.sid, "session token signed");
        Ok((token, claims))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        if data.claims.kind != SessionKind::Dashboard {
            anyhow::bail!("not a dashboard session");
        }
        Ok(data.claims)
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::from_config(&state.config.session)
    }
}

/// Holds the hashed shared secret and the sessions ended by logout.
pub struct DashboardGate {
    password_hash: String,
    // sid -> token expiry (unix seconds); pruned once past expiry
    revoked: Mutex<HashMap<Uuid, usize>>,
}

impl DashboardGate {
    pub fn new(shared_secret: &str) -> anyhow::Result<Self> {
        Ok(Self {
            password_hash: hash_password(shared_secret)?,
            revoked: Mutex::new(HashMap::new()),
        })
    }

    pub fn check_password(&self, candidate: &str) -> anyhow::Result<bool> {
        verify_password(candidate, &self.password_hash)
    }

    pub async fn revoke(&self, claims: &SessionClaims) {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let mut revoked = self.revoked.lock().await;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(claims.sid, claims.exp);
        debug!(sid = %claims.sid, "session revoked");
    }

    pub async fn is_revoked(&self, sid: &Uuid) -> bool {
        self.revoked.lock().await.contains_key(sid)
    }
}
