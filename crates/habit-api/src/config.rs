//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use database::Database;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Maximum pooled database connections.
    pub pool_size: u32,
    /// Shared bearer token. Requests are not token-checked when unset.
    pub api_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `HABITS_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:habits.db?mode=rwc` |
    /// | `HABITS_DB_POOL_SIZE` | Connection pool size | `20` |
    /// | `HABITS_API_TOKEN` | Bearer token required on `/api` routes | (unset) |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = lookup("HABITS_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = lookup("SQLITE_PATH")
            .unwrap_or_else(|| "sqlite:habits.db?mode=rwc".to_string());

        let pool_size = match lookup("HABITS_DB_POOL_SIZE") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::InvalidPoolSize(value)),
            },
            None => Database::DEFAULT_POOL_SIZE,
        };

        let api_token = lookup("HABITS_API_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        Ok(Self {
            addr,
            database_url,
            pool_size,
            api_token,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid HABITS_ADDR format")]
    InvalidAddr,

    #[error("Invalid HABITS_DB_POOL_SIZE: {0}")]
    InvalidPoolSize(String),
}
