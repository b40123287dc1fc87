/// Session-state repository port.
///
/// Exactly one state record exists per session. The UNIQUE(session_id)
/// constraint in the adapter is the check-and-create guard that keeps
/// session and state creation effectively atomic.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EditorState, SessionState, TerminalState, TestCase};

#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Inserts the one-to-one state record for a session.
    ///
    /// # Errors
    /// `StateAlreadyExists` when a record for the session already exists.
    async fn create(&self, state: &SessionState) -> DomainResult<()>;

    /// Fetches the state record for a session.
    async fn get_by_session(&self, session_id: Uuid) -> DomainResult<Option<SessionState>>;

    /// Replaces the editor sub-record.
    async fn update_editor(&self, session_id: Uuid, editor: &EditorState) -> DomainResult<()>;

    /// Replaces the terminal sub-record.
    async fn update_terminal(&self, session_id: Uuid, terminal: &TerminalState)
        -> DomainResult<()>;

    /// Replaces the full test case list.
    async fn update_test_cases(&self, session_id: Uuid, cases: &[TestCase]) -> DomainResult<()>;

    /// Replaces the stage pointer and its transition timestamps.
    async fn update_stage(
        &self,
        session_id: Uuid,
        index: u32,
        timestamps: &[DateTime<Utc>],
    ) -> DomainResult<()>;
}
