use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORAGE_BACKEND {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Storage key names. The candidate collection and the visit counter live
/// under separate keys of the same key-value store.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysConfig {
    pub candidates: String,
    pub visits: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            candidates: "candidates".into(),
            visits: "iisa-visits".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub keys: KeysConfig,
    /// Shared secret for the dashboard gate. Not a security boundary.
    pub dashboard_password: String,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(v) => StorageBackend::parse(&v)?,
            Err(_) => StorageBackend::Postgres,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE_BACKEND=postgres");
        }

        let defaults = KeysConfig::default();
        let keys = KeysConfig {
            candidates: std::env::var("CANDIDATES_KEY").unwrap_or(defaults.candidates),
            visits: std::env::var("VISITS_KEY").unwrap_or(defaults.visits),
        };

        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "candidate-portal".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "dashboard".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 8),
        };

        Ok(Self {
            backend,
            database_url,
            keys,
            dashboard_password: std::env::var("DASHBOARD_PASSWORD")
                .unwrap_or_else(|_| "reflectiz".into()),
            session,
        })
    }

    /// In-memory configuration used by tests and `AppState::fake`.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            keys: KeysConfig::default(),
            dashboard_password: "reflectiz".into(),
            session: SessionConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_known_names() {
        assert_eq!(StorageBackend::parse("postgres").unwrap(), StorageBackend::Postgres);
        assert_eq!(StorageBackend::parse(" Memory ").unwrap(), StorageBackend::Memory);
        assert!(StorageBackend::parse("redis").is_err());
    }

    #[test]
    fn default_keys_match_persisted_layout() {
        let keys = KeysConfig::default();
        assert_eq!(keys.candidates, "candidates");
        assert_eq!(keys.visits, "iisa-visits");
    }
}
