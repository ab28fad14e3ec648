use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::errors::ServiceError;

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_DIR: &str = "config";
const DEFAULT_EVENT_BUFFER: usize = 100;

/// Application configuration for the ledger core.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Database connection URL (postgres or sqlite)
    pub database_url: String,

    /// Deployment environment name
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level filter passed to tracing-subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run migrations automatically on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Maximum number of pooled database connections
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    /// Minimum number of pooled database connections
    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,

    /// Capacity of the in-process event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

impl AppConfig {
    /// Builds a configuration directly, used mostly by tests.
    pub fn new(database_url: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            environment: environment.into(),
            log_level: default_log_level(),
            auto_migrate: false,
            db_max_connections: default_max_connections(),
            db_min_connections: default_min_connections(),
            event_buffer_size: default_event_buffer(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Loads configuration from `config/{default,<env>}.toml` plus `LEDGER_*`
/// environment variables, later sources overriding earlier ones.
pub fn load_config() -> Result<AppConfig, ServiceError> {
    let env = std::env::var("LEDGER_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment '{}'", env);

    let default_path = Path::new(CONFIG_DIR).join("default");
    let env_path = Path::new(CONFIG_DIR).join(&env);

    let settings = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(Environment::with_prefix("LEDGER"))
        .set_override("environment", env.clone())
        .map_err(|e| ServiceError::ConfigError(e.to_string()))?
        .build()
        .map_err(|e| ServiceError::ConfigError(e.to_string()))?;

    let cfg: AppConfig = settings
        .try_deserialize()
        .map_err(|e| ServiceError::ConfigError(e.to_string()))?;

    if cfg.database_url.is_empty() {
        return Err(ServiceError::ConfigError(
            "database_url must not be empty".to_string(),
        ));
    }
    if cfg.db_min_connections > cfg.db_max_connections {
        return Err(ServiceError::ConfigError(format!(
            "db_min_connections ({}) exceeds db_max_connections ({})",
            cfg.db_min_connections, cfg.db_max_connections
        )));
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let cfg = AppConfig::new("sqlite::memory:", "test");
        assert_eq!(cfg.environment, "test");
        assert_eq!(cfg.db_max_connections, 10);
        assert!(!cfg.auto_migrate);
        assert!(!cfg.is_production());
    }
}
