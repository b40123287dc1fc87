//! Draft editing of a session's custom test cases.
//!
//! The candidate edits a local draft of the test case list; nothing reaches
//! the store until an explicit save. A save that changes nothing is a no-op,
//! so repeated saves never pad the event log.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EventPayload, SessionEvent, TestCase};

use super::event_log::EventLog;
use super::state_store::StateStore;

/// Hard cap on custom test cases per session.
pub const MAX_TEST_CASES: usize = 5;

pub struct TestCaseDraft {
    session_id: Uuid,
    state_id: Uuid,
    state_store: Arc<StateStore>,
    event_log: Arc<EventLog>,
    committed: Vec<TestCase>,
    draft: Vec<TestCase>,
}

impl TestCaseDraft {
    /// Loads the session's committed test cases as the starting draft.
    pub async fn load(
        session_id: Uuid,
        state_store: Arc<StateStore>,
        event_log: Arc<EventLog>,
    ) -> DomainResult<Self> {
        let state = state_store.state(session_id).await?;
        Ok(Self {
            session_id,
            state_id: state.id,
            state_store,
            event_log,
            committed: state.test_cases.clone(),
            draft: state.test_cases,
        })
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.committed
    }

    /// Adds a case to the draft.
    ///
    /// # Errors
    /// `TestCaseLimitExceeded` when the draft already holds the maximum.
    pub fn add(&mut self, case: TestCase) -> DomainResult<()> {
        if self.draft.len() >= MAX_TEST_CASES {
            return Err(DomainError::TestCaseLimitExceeded {
                max: MAX_TEST_CASES,
            });
        }
        self.draft.push(case);
        Ok(())
    }

    /// Replaces the case at `index`; out-of-range indices are ignored.
    pub fn update(&mut self, index: usize, case: TestCase) {
        if let Some(slot) = self.draft.get_mut(index) {
            *slot = case;
        }
    }

    /// Removes the case at `index`; out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) {
        if index < self.draft.len() {
            self.draft.remove(index);
        }
    }

    /// Commits the draft: replaces the stored list and logs one
    /// testcase-changed event carrying the before and after lists. Returns
    /// `None` without writing when the draft matches what is committed.
    pub async fn save(&mut self) -> DomainResult<Option<SessionEvent>> {
        if !self.is_dirty() {
            return Ok(None);
        }

        self.state_store
            .replace_test_cases(self.session_id, self.draft.clone())
            .await?;
        let event = self
            .event_log
            .append(
                self.state_id,
                &EventPayload::TestcaseChanged {
                    before: self.committed.clone(),
                    after: self.draft.clone(),
                },
            )
            .await?;

        self.committed = self.draft.clone();
        Ok(Some(event))
    }
}

/// Parses one raw input field from the test case form. Valid JSON keeps its
/// type (numbers, arrays, objects); anything else is taken as a plain string.
pub fn parse_case_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Builds a test case input map from raw form fields, one entry per
/// parameter.
pub fn build_case_input<'a, I>(fields: I) -> HashMap<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fields
        .into_iter()
        .map(|(name, raw)| (name.to_string(), parse_case_value(raw)))
        .collect()
}
