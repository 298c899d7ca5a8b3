//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::fx::ArsSource;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Which Argentine dollar quote the USD/ARS provider uses
    pub ars_source: ArsSource,

    /// Per-request timeout for rate provider calls
    pub fx_timeout: Duration,

    /// How often the pending-transaction sweep runs
    pub sweep_interval: Duration,

    /// Retry budget per pending transaction
    pub pending_max_retries: i32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let ars_source = match env::var("ARS_SOURCE") {
            Ok(value) => {
                ArsSource::parse(&value).ok_or(ConfigError::InvalidValue("ARS_SOURCE"))?
            }
            Err(_) => ArsSource::Blue,
        };

        let fx_timeout_secs: u64 = env::var("FX_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("FX_TIMEOUT_SECS"))?;

        let sweep_interval_secs: u64 = env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "7200".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SWEEP_INTERVAL_SECS"))?;

        let pending_max_retries: i32 = env::var("PENDING_MAX_RETRIES")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PENDING_MAX_RETRIES"))?;

        if pending_max_retries < 1 {
            return Err(ConfigError::InvalidValue("PENDING_MAX_RETRIES"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            ars_source,
            fx_timeout: Duration::from_secs(fx_timeout_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            pending_max_retries,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
