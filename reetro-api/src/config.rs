//! Application Configuration
//!
//! One [`AppConfig`] is built at startup from the environment (after loading
//! `.env` files with `dotenvy`) and handed to every component that needs it.
//! Nothing reads the environment after startup.

use crate::auth::{AuthConfig, JwtSecret, DEFAULT_TOKEN_TTL_SECS};
use crate::db::DbConfig;
use reetro_core::ConfigError;
use reetro_storage::RedisConfig;
use std::net::SocketAddr;
use std::str::FromStr;

// ============================================================================
// ENV LOOKUP
// ============================================================================

/// Source of configuration values. Production uses the process environment;
/// tests pass a map.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Parse `key`, falling back to `default` when unset or blank.
    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key).filter(|v| !v.trim().is_empty()) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw.clone(),
                reason: "could not be parsed".to_string(),
            }),
        }
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for std::collections::HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        std::collections::HashMap::get(self, key).cloned()
    }
}

/// Load `.env` and `.envs/.env` into the process environment if present.
/// Variables already set are not overwritten.
pub fn load_dotenv() {
    for path in [".env", ".envs/.env"] {
        match dotenvy::from_filename(path) {
            Ok(_) => tracing::debug!(path, "loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(path, error = %e, "failed to read environment file"),
        }
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "APPLICATION_HOST".to_string(),
                value: self.host.clone(),
                reason: "not a valid listen address".to_string(),
            })
    }
}

/// Outgoing mail settings. Only used to label the sender; delivery itself is
/// the mailer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailConfig {
    pub from: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(ConfigError::InvalidValue {
                field: "CACHE_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected memory or redis".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" => Ok(StoreBackend::Postgres),
            other => Err(ConfigError::InvalidValue {
                field: "STORE_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected memory or postgres".to_string(),
            }),
        }
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub cache_backend: CacheBackend,
    pub store_backend: StoreBackend,
    /// `APP_ENV=production` tightens secret checks.
    pub is_production: bool,
}

impl AppConfig {
    /// Load `.env` files, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_source(&ProcessEnv)
    }

    /// Build from any [`EnvSource`].
    ///
    /// Environment variables:
    /// - `APPLICATION_HOST`, `APPLICATION_PORT` (default `0.0.0.0:8000`)
    /// - `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_USER`, `POSTGRES_PASSWORD`,
    ///   `POSTGRES_DB`, `POSTGRES_POOL_SIZE`
    /// - `REDIS_HOST`, `REDIS_PORT`, `REDIS_POOL_SIZE`
    /// - `JWT_SECRET_KEY` (required), `JWT_EXPIRATION_SECS`, `JWT_CLOCK_SKEW_SECS`
    /// - `EMAIL_ID`, `EMAIL_HOST`, `EMAIL_PORT`
    /// - `CACHE_BACKEND` (`memory`|`redis`), `STORE_BACKEND` (`memory`|`postgres`)
    /// - `APP_ENV`
    pub fn from_source(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let is_production = env.string_or("APP_ENV", "development") == "production";

        let server = ServerConfig {
            host: env.string_or("APPLICATION_HOST", "0.0.0.0"),
            port: env.parse_or("APPLICATION_PORT", 8000)?,
        };

        let redis_defaults = RedisConfig::default();
        let redis = RedisConfig {
            host: env.string_or("REDIS_HOST", &redis_defaults.host),
            port: env.parse_or("REDIS_PORT", redis_defaults.port)?,
            pool_size: env.parse_or("REDIS_POOL_SIZE", redis_defaults.pool_size)?,
            timeout_ms: redis_defaults.timeout_ms,
        };

        let secret = env.get("JWT_SECRET_KEY").ok_or(ConfigError::MissingRequired {
            field: "JWT_SECRET_KEY".to_string(),
        })?;
        let mut auth = AuthConfig::new(JwtSecret::new(secret)?);
        auth.jwt_expiration_secs = env.parse_or("JWT_EXPIRATION_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        auth.jwt_clock_skew_secs = env.parse_or("JWT_CLOCK_SKEW_SECS", 0)?;
        auth.validate_for_environment(is_production)?;

        let email = EmailConfig {
            from: env.string_or("EMAIL_ID", "no-reply@reetro.local"),
            host: env.string_or("EMAIL_HOST", "localhost"),
            port: env.parse_or("EMAIL_PORT", 587)?,
        };

        Ok(Self {
            server,
            db: DbConfig::from_source(env)?,
            redis,
            auth,
            email,
            cache_backend: env.parse_or("CACHE_BACKEND", CacheBackend::Redis)?,
            store_backend: env.parse_or("STORE_BACKEND", StoreBackend::Postgres)?,
            is_production,
        })
    }
}
