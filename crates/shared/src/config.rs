//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Cube maintenance defaults.
    #[serde(default)]
    pub cube: CubeConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Defaults governing cube backfill/maintenance behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct CubeConfig {
    /// Default number of periods processed per backfill batch.
    #[serde(default = "default_backfill_batch_size")]
    pub backfill_batch_size: u32,
    /// Pause between backfill batches, in milliseconds.
    #[serde(default = "default_backfill_batch_pause_ms")]
    pub backfill_batch_pause_ms: u64,
    /// Default window (in days) used by `balance_history`/`balance_summary`
    /// when the caller does not supply an explicit range.
    #[serde(default = "default_history_window_days")]
    pub default_history_window_days: i64,
    /// Epsilon below which two decimal amounts are considered equal for
    /// reconciliation and consistency checks.
    #[serde(default = "default_amount_epsilon")]
    pub amount_epsilon: String,
}

fn default_backfill_batch_size() -> u32 {
    100
}

fn default_backfill_batch_pause_ms() -> u64 {
    100
}

fn default_history_window_days() -> i64 {
    30
}

fn default_amount_epsilon() -> String {
    "0.005".to_string()
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            backfill_batch_size: default_backfill_batch_size(),
            backfill_batch_pause_ms: default_backfill_batch_pause_ms(),
            default_history_window_days: default_history_window_days(),
            amount_epsilon: default_amount_epsilon(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERCUBE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
