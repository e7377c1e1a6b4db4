use std::env;

use crate::error::ConfigError;

const LOCAL_JWT_SECRET: &str = "atmosfera-local-development-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24;

/// AppConfig
///
/// Immutable runtime configuration, loaded once at startup and shared through
/// `AppState` (pulled into extractors and middleware via `FromRef`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local session bypass and the demo gate.
    pub env: Env,
    // Postgres connection string. Locally optional: without it the in-memory store is used.
    pub db_url: Option<String>,
    // HS256 secret used to verify (and, for the demo flow, sign) session tokens.
    pub jwt_secret: String,
    pub bind_addr: String,
    // Lifetime of session cookies and demo tokens.
    pub session_ttl_secs: u64,
}

/// Env
///
/// `Local` enables development conveniences (x-user-id bypass, open `/demo`,
/// pretty logs); `Production` hardens all of them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    pub fn is_production(self) -> bool {
        self == Env::Production
    }
}

impl Default for AppConfig {
    /// Safe values for test scaffolding; never reads the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production refuses
    /// to start without `DATABASE_URL` and `JWT_SECRET`.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").unwrap_or_default().trim() {
            "production" | "prod" => Env::Production,
            _ => Env::Local,
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let jwt_secret = env::var("JWT_SECRET").ok().filter(|secret| !secret.is_empty());

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(db_url.ok_or(ConfigError::Missing("DATABASE_URL"))?),
                jwt_secret.ok_or(ConfigError::Missing("JWT_SECRET"))?,
            ),
            Env::Local => (
                db_url,
                jwt_secret.unwrap_or_else(|| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        let session_ttl_secs = match env::var("SESSION_TTL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("SESSION_TTL_SECS", raw))?,
            Err(_) => DEFAULT_SESSION_TTL_SECS,
        };

        Ok(Self {
            env,
            db_url,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            session_ttl_secs,
        })
    }
}
