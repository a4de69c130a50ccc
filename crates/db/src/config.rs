use std::time::Duration;

use enroll_core::config::{self, ConfigError, Lookup};

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
    /// How long to wait for a free connection (default: 5 seconds).
    pub acquire_timeout: Duration,
}

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default |
    /// |---------------------------|----------|---------|
    /// | `DATABASE_URL`            | **yes**  | --      |
    /// | `DB_MAX_CONNECTIONS`      | no       | `20`    |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | no       | `5`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&config::env_lookup)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let database_url = config::required(lookup, "DATABASE_URL")?;
        let max_connections =
            config::parse_or(lookup, "DB_MAX_CONNECTIONS", "u32", DEFAULT_MAX_CONNECTIONS)?;
        let acquire_timeout_secs = config::parse_or(
            lookup,
            "DB_ACQUIRE_TIMEOUT_SECS",
            "u64",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }
}
