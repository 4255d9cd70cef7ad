//! Workshop service configuration.

use std::time::Duration;

use common::{env_parse, AppResult, DatabaseConfig, JwtConfig};
use domain::{DEFAULT_STALE_AFTER_HOURS, DEFAULT_SWEEP_INTERVAL_MINUTES};

/// Auto-cancel sweep configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Whether the recurring sweep runs at all
    pub enabled: bool,
    /// Time between two sweeps
    pub interval: Duration,
    /// Age after which a pending record is cancelled
    pub stale_after: chrono::Duration,
}

impl SweepConfig {
    /// Load from `SWEEP_ENABLED`, `SWEEP_INTERVAL_MINUTES` and
    /// `SWEEP_STALE_AFTER_HOURS`.
    pub fn from_env() -> Self {
        let minutes = env_parse("SWEEP_INTERVAL_MINUTES", DEFAULT_SWEEP_INTERVAL_MINUTES).max(1);
        let hours = env_parse("SWEEP_STALE_AFTER_HOURS", DEFAULT_STALE_AFTER_HOURS).max(1);

        Self {
            enabled: env_parse("SWEEP_ENABLED", true),
            interval: Duration::from_secs(minutes * 60),
            stale_after: chrono::Duration::hours(hours),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_MINUTES * 60),
            stale_after: chrono::Duration::hours(DEFAULT_STALE_AFTER_HOURS),
        }
    }
}

/// Workshop service configuration.
#[derive(Debug, Clone)]
pub struct WorkshopServiceConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub sweep: SweepConfig,
}

impl WorkshopServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Fails when the JWT secret is missing or too short.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env()?,
            sweep: SweepConfig::from_env(),
        })
    }
}
