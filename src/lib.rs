//! Greenroom - Interview Session State Core
//!
//! Greenroom is the state synchronization and event-sourcing core for
//! AI-led mock coding interviews: session lifecycle, the authoritative
//! session-state projection, an append-only behavioral event log, deadline
//! and evaluation scheduling, and debounced client synchronization.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic and domain models
//! - **Service Layer** (`services`): Business logic coordination
//! - **Adapter Layer** (`adapters`): SQLite and HTTP port implementations
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//!
//! # Example
//!
//! ```ignore
//! use greenroom::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let pool = greenroom::adapters::sqlite::initialize_database(&config.database.path).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, DatabaseConfig, EditorState, EvaluationJob, EvaluationJobStatus, EventPayload,
    LoggingConfig, QuestionSpec, RetryConfig, SchedulerConfig, Session, SessionEvent,
    SessionState, SessionStatus, SyncConfig, TerminalState, TestCase, TestCaseResult,
};
pub use domain::ports::{
    EvaluationDispatcher, EvaluationJobRepository, EventRepository, MinutesLedger,
    QuestionProvider, SessionRepository, StateRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    DeadlineTable, EditorSync, EventLog, SessionScheduler, SessionService, StateNotifier,
    StateStore, SweepOutcome, TestCaseDraft,
};
