use std::env;

use thiserror::Error;

const LOCAL_JWT_SECRET: &str = "dman-local-development-secret";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// shared with handlers and the auth extractor through `FromRef`, so nothing reads
/// the environment after startup.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Production refuses to start without real secrets.
    pub env: Env,
    // Postgres connection string. `None` (local only) selects the in-memory repository.
    pub db_url: Option<String>,
    // HS256 secret used to sign and verify tokens.
    pub jwt_secret: String,
    // Token lifetime.
    pub token_ttl_hours: i64,
    pub bind_addr: String,
    // Optional admin account created at startup.
    pub admin_seed: Option<AdminSeed>,
}

/// Env
///
/// Defines the runtime context: developer conveniences in `Local`, hard requirements
/// in `Production`.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// AdminSeed
///
/// Credentials for the bootstrap admin (`ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_FULL_NAME`).
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not valid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test state scaffolding: local env, no database,
    /// the local JWT secret and the default token lifetime.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            admin_seed: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables. In production `DATABASE_URL`
    /// and `JWT_SECRET` are mandatory; locally both fall back (to the in-memory
    /// repository and a development secret respectively).
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let db_url = non_empty("DATABASE_URL");
        let jwt_secret = non_empty("JWT_SECRET");

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

        let token_ttl_hours = match non_empty("TOKEN_TTL_HOURS") {
            None => DEFAULT_TOKEN_TTL_HOURS,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(ConfigError::Invalid {
                    name: "TOKEN_TTL_HOURS",
                    value: raw,
                })?,
        };

        let admin_seed = match (non_empty("ADMIN_EMAIL"), non_empty("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                full_name: non_empty("ADMIN_FULL_NAME")
                    .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
                email: email.trim().to_lowercase(),
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        Ok(Self {
            env,
            db_url,
            jwt_secret,
            token_ttl_hours,
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            admin_seed,
        })
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
