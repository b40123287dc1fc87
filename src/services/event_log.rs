//! Append-only session event log.
//!
//! Thin service over the event repository. Appends are unconditional:
//! concurrent origins (candidate edits, voice-agent test runs) interleave in
//! whatever order the storage layer commits them, and that order is the
//! behavioral record the evaluation consumer reads.

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{replay_events, EventPayload, SessionEvent, SessionState};
use crate::domain::ports::EventRepository;

pub struct EventLog {
    events: Arc<dyn EventRepository>,
}

impl EventLog {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    /// Appends one event and returns it with its assigned sequence number.
    #[instrument(skip(self, payload), fields(kind = payload.kind()), err)]
    pub async fn append(
        &self,
        state_id: Uuid,
        payload: &EventPayload,
    ) -> DomainResult<SessionEvent> {
        self.events.append(state_id, payload).await
    }

    /// All events of a state record in commit order.
    pub async fn list_by_state(&self, state_id: Uuid) -> DomainResult<Vec<SessionEvent>> {
        self.events.list_by_state(state_id).await
    }

    /// All events of a session in commit order. Single bulk read; the
    /// sequence is stable and restartable.
    pub async fn list_by_session(&self, session_id: Uuid) -> DomainResult<Vec<SessionEvent>> {
        self.events.list_by_session(session_id).await
    }

    /// Flips the acknowledgement flag the voice agent sets after consuming
    /// an event.
    pub async fn acknowledge(&self, event_id: Uuid) -> DomainResult<()> {
        self.events.acknowledge(event_id).await
    }

    pub async fn count_for_state(&self, state_id: Uuid) -> DomainResult<u64> {
        self.events.count_for_state(state_id).await
    }

    /// Reconstructs a session's final projection from its event log.
    /// Audit/replay tooling entry point.
    pub async fn replay_session(
        &self,
        session_id: Uuid,
        initial: SessionState,
    ) -> DomainResult<SessionState> {
        let events = self.list_by_session(session_id).await?;
        Ok(replay_events(initial, &events))
    }
}
