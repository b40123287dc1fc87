use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid default_time_limit_minutes: {0}. Must be at least 1")]
    InvalidTimeLimit(u32),

    #[error("Invalid tick_interval_ms: {0}. Must be at least 1")]
    InvalidTickInterval(u64),

    #[error("Invalid max_dispatch_attempts: {0}. Cannot be 0")]
    InvalidMaxDispatchAttempts(u32),

    #[error("Invalid evaluation_timeout_secs: {0}. Must be at least 1")]
    InvalidEvaluationTimeout(u64),

    #[error("Dispatcher base_url cannot be empty")]
    EmptyDispatcherUrl,

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .greenroom/config.yaml (project config)
    /// 3. .greenroom/local.yaml (project local overrides, optional)
    /// 4. Environment variables (GREENROOM_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".greenroom/config.yaml"))
            .merge(Yaml::file(".greenroom/local.yaml"))
            .merge(Env::prefixed("GREENROOM_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.session.default_time_limit_minutes == 0 {
            return Err(ConfigError::InvalidTimeLimit(
                config.session.default_time_limit_minutes,
            ));
        }

        if config.scheduler.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval(
                config.scheduler.tick_interval_ms,
            ));
        }

        if config.scheduler.max_dispatch_attempts == 0 {
            return Err(ConfigError::InvalidMaxDispatchAttempts(
                config.scheduler.max_dispatch_attempts,
            ));
        }

        if config.scheduler.evaluation_timeout_secs == 0 {
            return Err(ConfigError::InvalidEvaluationTimeout(
                config.scheduler.evaluation_timeout_secs,
            ));
        }

        if config.dispatcher.base_url.is_empty() {
            return Err(ConfigError::EmptyDispatcherUrl);
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}
