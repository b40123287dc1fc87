use serde::{Deserialize, Serialize};

/// Main configuration structure for Greenroom
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// Deadline/sweep scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Client synchronization configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Evaluation dispatcher configuration
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Retry policy for transient dispatch failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            session: SessionConfig::default(),
            scheduler: SchedulerConfig::default(),
            sync: SyncConfig::default(),
            dispatcher: DispatcherConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".greenroom/greenroom.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            retention_days: default_retention_days(),
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Default time limit for a new session, in minutes
    #[serde(default = "default_time_limit_minutes")]
    pub default_time_limit_minutes: u32,
}

const fn default_time_limit_minutes() -> u32 {
    45
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_time_limit_minutes: default_time_limit_minutes(),
        }
    }
}

/// Deadline/sweep scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Deadline tick interval in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Interval between evaluation sweep passes, in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Dispatch attempts before a job is marked failed
    #[serde(default = "default_max_dispatch_attempts")]
    pub max_dispatch_attempts: u32,

    /// Claimed jobs older than this are marked timed out, in seconds
    #[serde(default = "default_evaluation_timeout_secs")]
    pub evaluation_timeout_secs: u64,
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_sweep_interval_secs() -> u64 {
    3600
}

const fn default_max_dispatch_attempts() -> u32 {
    5
}

const fn default_evaluation_timeout_secs() -> u64 {
    1800
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_dispatch_attempts: default_max_dispatch_attempts(),
            evaluation_timeout_secs: default_evaluation_timeout_secs(),
        }
    }
}

/// Client synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Quiet period for the editor debounce window, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

const fn default_debounce_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Evaluation dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DispatcherConfig {
    /// Base URL of the external evaluation service
    #[serde(default = "default_dispatcher_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_dispatcher_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_dispatcher_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

const fn default_dispatcher_timeout_secs() -> u64 {
    30
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            base_url: default_dispatcher_base_url(),
            timeout_secs: default_dispatcher_timeout_secs(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts within one dispatch call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
