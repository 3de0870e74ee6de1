//! Server configuration.
//!
//! Layered with the `config` crate, later sources overriding earlier ones:
//!
//! ```text
//! built-in defaults  →  $KASIR_CONFIG (toml, optional)  →  KASIR_* env vars
//! ```
//!
//! | Key                 | Env                      | Default                |
//! |---------------------|--------------------------|------------------------|
//! | `host`              | `KASIR_HOST`             | `0.0.0.0`              |
//! | `port`              | `KASIR_PORT`             | `3000`                 |
//! | `database_path`     | `KASIR_DATABASE_PATH`    | `kasir.db`             |
//! | `session_secret`    | `KASIR_SESSION_SECRET`   | development secret     |
//! | `session_ttl_secs`  | `KASIR_SESSION_TTL_SECS` | `43200` (12 hours)     |
//! | `cache_capacity`    | `KASIR_CACHE_CAPACITY`   | `100`                  |
//! | `cache_ttl_secs`    | `KASIR_CACHE_TTL_SECS`   | `300`                  |
//! | `cache_sweep_secs`  | `KASIR_CACHE_SWEEP_SECS` | `60`                   |
//! | `cookie_secure`     | `KASIR_COOKIE_SECURE`    | `false`                |

use std::env;
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::Deserialize;

use kasir_core::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};

/// Used when no secret is configured. The server logs a warning at startup.
pub const DEVELOPMENT_SECRET: &str = "kasir-dev-secret-change-in-production";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// SQLite file, created on first start.
    pub database_path: String,

    /// HS256 key for session tokens.
    pub session_secret: String,

    pub session_ttl_secs: i64,

    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,

    /// Interval of the background expired-entry sweep.
    pub cache_sweep_secs: u64,

    /// Adds `Secure` to the session cookie (enable behind HTTPS).
    pub cookie_secure: bool,
}

impl ServerConfig {
    /// Loads defaults, the optional file named by `KASIR_CONFIG`, then the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000_i64)?
            .set_default("database_path", "kasir.db")?
            .set_default("session_secret", DEVELOPMENT_SECRET)?
            .set_default("session_ttl_secs", 12 * 60 * 60_i64)?
            .set_default("cache_capacity", DEFAULT_CACHE_CAPACITY as i64)?
            .set_default("cache_ttl_secs", DEFAULT_CACHE_TTL_SECS as i64)?
            .set_default("cache_sweep_secs", 60_i64)?
            .set_default("cookie_secure", false)?;

        if let Ok(path) = env::var("KASIR_CONFIG") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let config: ServerConfig = builder
            .add_source(Environment::with_prefix("KASIR").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests: in-memory database, fixed secret.
    pub fn for_tests() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_path: ":memory:".to_string(),
            session_secret: "test-secret".to_string(),
            session_ttl_secs: 3600,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_sweep_secs: 60,
            cookie_secure: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("session_secret".to_string()));
        }
        if self.session_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("session_ttl_secs".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue("cache_capacity".to_string()));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("cache_ttl_secs".to_string()));
        }
        if self.cache_sweep_secs == 0 {
            return Err(ConfigError::InvalidValue("cache_sweep_secs".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue("database_path".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs)
    }

    pub fn uses_development_secret(&self) -> bool {
        self.session_secret == DEVELOPMENT_SECRET
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
