//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that adapters must implement:
//! - `SessionRepository` / `StateRepository` / `EventRepository` /
//!   `EvaluationJobRepository`: persistence
//! - `QuestionProvider`: the external question bank
//! - `EvaluationDispatcher`: the external evaluation trigger
//! - `MinutesLedger`: the external billing balance
//!
//! These contracts keep the domain independent of specific infrastructure.

pub mod evaluation_dispatcher;
pub mod evaluation_job_repository;
pub mod event_repository;
pub mod minutes_ledger;
pub mod question_provider;
pub mod session_repository;
pub mod state_repository;

pub use evaluation_dispatcher::EvaluationDispatcher;
pub use evaluation_job_repository::EvaluationJobRepository;
pub use event_repository::EventRepository;
pub use minutes_ledger::{MinutesLedger, NullMinutesLedger};
pub use question_provider::QuestionProvider;
pub use session_repository::SessionRepository;
pub use state_repository::StateRepository;
