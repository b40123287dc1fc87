/// Session repository port (trait) for dependency injection.
///
/// Defines the contract for session persistence. Services depend on this
/// trait, not on a concrete storage adapter.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Session, SessionStatus};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts a new session.
    async fn create(&self, session: &Session) -> DomainResult<()>;

    /// Fetches a session by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Session>>;

    /// Persists the full session record.
    async fn update(&self, session: &Session) -> DomainResult<()>;

    /// Finds the user's session that is NotStarted or InProgress, if any.
    ///
    /// At most one such session can exist per user.
    async fn find_active_for_user(&self, user_id: &str) -> DomainResult<Option<Session>>;

    /// Lists sessions in a given status.
    async fn list_by_status(&self, status: SessionStatus) -> DomainResult<Vec<Session>>;

    /// Flips the evaluation-ready flag.
    ///
    /// Called by the external evaluation result writer; the core only reads
    /// the flag.
    async fn set_evaluation_ready(&self, id: Uuid) -> DomainResult<()>;
}
