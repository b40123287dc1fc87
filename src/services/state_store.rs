//! Session state store: the single authoritative projection of a session.
//!
//! Live reads are O(1) against the projection; the event log is a side
//! record maintained alongside it, never replayed on the read path. Editor
//! patches deliberately do not log an event themselves: event creation
//! belongs to the edit origin (the sync layer), so that non-edit writes such
//! as test execution never produce a spurious content-changed event.

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    EditorState, EventPayload, SessionEvent, SessionState, StageState, TerminalState, TestCase,
    TestCaseResult,
};
use crate::domain::ports::{EventRepository, SessionRepository, StateRepository};

use super::state_notifier::{StateNotifier, StateUpdate};

pub struct StateStore {
    sessions: Arc<dyn SessionRepository>,
    states: Arc<dyn StateRepository>,
    events: Arc<dyn EventRepository>,
    notifier: Arc<StateNotifier>,
}

impl StateStore {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        states: Arc<dyn StateRepository>,
        events: Arc<dyn EventRepository>,
        notifier: Arc<StateNotifier>,
    ) -> Self {
        Self {
            sessions,
            states,
            events,
            notifier,
        }
    }

    /// Creates the one-to-one state record for a freshly created session and
    /// seeds the event log with the initial content-changed event
    /// (before="" , after=initial content).
    ///
    /// The UNIQUE(session_id) constraint in storage rejects a second create,
    /// which keeps session and state creation effectively atomic even when
    /// the two inserts race.
    #[instrument(skip(self, initial_content, test_cases), err)]
    pub async fn create_for_session(
        &self,
        session_id: Uuid,
        language: &str,
        initial_content: &str,
        test_cases: Vec<TestCase>,
    ) -> DomainResult<SessionState> {
        let state = SessionState::new(session_id, language, initial_content, test_cases);
        self.states.create(&state).await?;

        self.events
            .append(
                state.id,
                &EventPayload::ContentChanged {
                    before: String::new(),
                    after: initial_content.to_string(),
                },
            )
            .await?;

        Ok(state)
    }

    async fn require_state(&self, session_id: Uuid) -> DomainResult<SessionState> {
        self.states
            .get_by_session(session_id)
            .await?
            .ok_or(DomainError::StateNotFound(session_id))
    }

    /// The full projection. Fails with `StateNotFound` when no state exists;
    /// given the creation invariant that indicates a data-integrity problem.
    pub async fn state(&self, session_id: Uuid) -> DomainResult<SessionState> {
        self.require_state(session_id).await
    }

    pub async fn editor_state(&self, session_id: Uuid) -> DomainResult<EditorState> {
        Ok(self.require_state(session_id).await?.editor)
    }

    pub async fn terminal_state(&self, session_id: Uuid) -> DomainResult<TerminalState> {
        Ok(self.require_state(session_id).await?.terminal)
    }

    pub async fn test_cases_state(&self, session_id: Uuid) -> DomainResult<Vec<TestCase>> {
        Ok(self.require_state(session_id).await?.test_cases)
    }

    pub async fn stage_state(&self, session_id: Uuid) -> DomainResult<StageState> {
        let state = self.require_state(session_id).await?;
        Ok(StageState {
            index: state.stage_index,
            timestamps: state.stage_timestamps,
        })
    }

    /// Full replace of the editor content. Bumps `last_updated`; does not
    /// log an event (the caller owns event creation).
    #[instrument(skip(self, content), err)]
    pub async fn patch_editor(
        &self,
        session_id: Uuid,
        content: &str,
    ) -> DomainResult<EditorState> {
        let state = self.require_state(session_id).await?;
        let editor = EditorState {
            language: state.editor.language,
            content: content.to_string(),
            last_updated: Utc::now(),
        };
        self.states.update_editor(session_id, &editor).await?;

        self.notifier.publish(StateUpdate::Editor {
            session_id,
            editor: editor.clone(),
        });
        Ok(editor)
    }

    /// Full replace of the terminal sub-record; does not log an event.
    #[instrument(skip(self, terminal), err)]
    pub async fn patch_terminal(
        &self,
        session_id: Uuid,
        terminal: TerminalState,
    ) -> DomainResult<()> {
        self.require_state(session_id).await?;
        self.states.update_terminal(session_id, &terminal).await?;

        self.notifier.publish(StateUpdate::Terminal {
            session_id,
            terminal,
        });
        Ok(())
    }

    /// Full replace of the test case list; does not log an event.
    #[instrument(skip(self, cases), err)]
    pub async fn replace_test_cases(
        &self,
        session_id: Uuid,
        cases: Vec<TestCase>,
    ) -> DomainResult<()> {
        self.require_state(session_id).await?;
        self.states.update_test_cases(session_id, &cases).await?;

        self.notifier.publish(StateUpdate::TestCases {
            session_id,
            test_cases: cases,
        });
        Ok(())
    }

    /// Advances the stage pointer by one and appends a transition timestamp.
    ///
    /// `index == flow.len()` is the valid end-of-flow value; advancing past
    /// it fails with `StageOverflow`.
    #[instrument(skip(self), err)]
    pub async fn advance_stage(&self, session_id: Uuid) -> DomainResult<u32> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or(DomainError::SessionNotFound(session_id))?;
        let state = self.require_state(session_id).await?;

        let stages = u32::try_from(session.flow.len())
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        if state.stage_index >= stages {
            return Err(DomainError::StageOverflow {
                index: state.stage_index,
                stages,
            });
        }

        let index = state.stage_index + 1;
        let mut timestamps = state.stage_timestamps;
        timestamps.push(Utc::now());
        self.states
            .update_stage(session_id, index, &timestamps)
            .await?;

        self.notifier.publish(StateUpdate::Stage {
            session_id,
            stage_index: index,
        });
        Ok(index)
    }

    /// Records one test run: patches the terminal projection and appends the
    /// corresponding executed-event in one call.
    ///
    /// Used by the voice-agent backend, which is the only origin of test
    /// execution writes.
    #[instrument(skip(self, results), fields(cases = results.len()), err)]
    pub async fn record_test_run(
        &self,
        session_id: Uuid,
        ground_truth: bool,
        results: Vec<TestCaseResult>,
        execution_time_ms: Option<u64>,
    ) -> DomainResult<SessionEvent> {
        let state = self.require_state(session_id).await?;

        let terminal = TerminalState::from_results(&results, execution_time_ms);
        self.states.update_terminal(session_id, &terminal).await?;

        let payload = if ground_truth {
            EventPayload::GroundtruthTestcaseExecuted {
                test_results: results,
            }
        } else {
            EventPayload::UserTestcaseExecuted {
                test_results: results,
            }
        };
        let event = self.events.append(state.id, &payload).await?;

        self.notifier.publish(StateUpdate::Terminal {
            session_id,
            terminal,
        });
        Ok(event)
    }

    /// Subscribe to committed state updates.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StateUpdate> {
        self.notifier.subscribe()
    }
}
