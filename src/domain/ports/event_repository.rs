/// Event log repository port.
///
/// The log is append-only: no update or delete operations exist beyond the
/// acknowledgement flag. Ordering is the storage layer's insertion order.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EventPayload, SessionEvent};

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Appends one event unconditionally and returns it with its assigned
    /// sequence number.
    ///
    /// No business-rule validation happens here; the log's job is fidelity.
    async fn append(&self, state_id: Uuid, payload: &EventPayload) -> DomainResult<SessionEvent>;

    /// All events of a state record, ascending by sequence.
    async fn list_by_state(&self, state_id: Uuid) -> DomainResult<Vec<SessionEvent>>;

    /// All events of a session (joined through its state record), ascending
    /// by sequence. Single bulk read; no pagination.
    async fn list_by_session(&self, session_id: Uuid) -> DomainResult<Vec<SessionEvent>>;

    /// Flips the acknowledgement flag on one event.
    async fn acknowledge(&self, event_id: Uuid) -> DomainResult<()>;

    /// Number of events recorded for a state record.
    async fn count_for_state(&self, state_id: Uuid) -> DomainResult<u64>;
}
