//! Domain errors for the Greenroom interview-session core.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors surfaced by session, state, and event operations.
///
/// Precondition violations (`AlreadyCompleted`, `ActiveSessionExists`,
/// `EvaluationJobExists`, ...) indicate a caller logic bug or a genuine
/// double-submit and are never swallowed. Not-found variants indicate a
/// data-integrity problem and are not retried.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session state not found for session: {0}")]
    StateNotFound(Uuid),

    #[error("Question not found: {0}")]
    QuestionNotFound(Uuid),

    #[error("Session already completed: {0}")]
    AlreadyCompleted(Uuid),

    #[error("User {user_id} already has an active session: {session_id}")]
    ActiveSessionExists { user_id: String, session_id: Uuid },

    #[error("Session state already exists for session: {0}")]
    StateAlreadyExists(Uuid),

    #[error("Evaluation job already exists for session: {0}")]
    EvaluationJobExists(Uuid),

    #[error("Evaluation job not found for session: {0}")]
    EvaluationJobNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Cannot advance stage past end of flow (index {index}, {stages} stages)")]
    StageOverflow { index: u32, stages: u32 },

    #[error("Test case limit exceeded: at most {max} test cases per session")]
    TestCaseLimitExceeded { max: usize },

    #[error("Evaluation dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
