//! Session state domain model.
//!
//! The session state is the single authoritative projection of what the
//! candidate currently sees: editor text, terminal output, test cases, and
//! the stage pointer. Live reads always hit this projection; the event log
//! is a side record, not the source of truth for reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::event::{EventPayload, SessionEvent, TestCaseResult};

/// Editor sub-record: the candidate's current code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    /// Language the editor is configured for (e.g. "python")
    pub language: String,

    /// Full text of the current code
    pub content: String,

    /// Bumped on every committed editor write
    pub last_updated: DateTime<Utc>,
}

/// Terminal sub-record: output of the most recent test run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalState {
    /// Last output text shown to the candidate
    pub output: String,

    /// Whether the last run ended in an error
    pub is_error: bool,

    /// Wall-clock execution time of the last run, when known
    pub execution_time_ms: Option<u64>,
}

impl TerminalState {
    /// Derive the terminal projection from a set of per-case results.
    ///
    /// Used both by the run recorder and by event replay so that the two
    /// agree on the projected text.
    pub fn from_results(results: &[TestCaseResult], execution_time_ms: Option<u64>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let is_error = results.iter().any(|r| r.error.is_some());
        let mut output = format!("{passed}/{} test cases passed", results.len());
        if let Some(first_error) = results.iter().find_map(|r| r.error.as_deref()) {
            output.push('\n');
            output.push_str(first_error);
        }
        Self {
            output,
            is_error,
            execution_time_ms,
        }
    }
}

/// One test case in the session's working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Parameter name -> value mapping
    pub input: HashMap<String, Value>,

    #[serde(
        rename = "expectedOutput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_output: Option<Value>,
}

/// Stage pointer view: where the candidate is in the interview flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    /// 0-based index into the session's flow; `flow.len()` means end-of-flow
    pub index: u32,

    /// One timestamp appended per stage advance
    pub timestamps: Vec<DateTime<Utc>>,
}

/// The one-to-one mutable projection of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique state record identifier
    pub id: Uuid,

    /// Owning session (UNIQUE in storage; exactly one state per session)
    pub session_id: Uuid,

    pub editor: EditorState,

    pub terminal: TerminalState,

    /// Ordered working set of test cases
    pub test_cases: Vec<TestCase>,

    /// Current stage index (0-based pointer into the session flow)
    pub stage_index: u32,

    /// One entry appended each time the stage advances
    pub stage_timestamps: Vec<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Creates the initial projection for a freshly created session.
    pub fn new(
        session_id: Uuid,
        language: impl Into<String>,
        content: impl Into<String>,
        test_cases: Vec<TestCase>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id,
            editor: EditorState {
                language: language.into(),
                content: content.into(),
                last_updated: now,
            },
            terminal: TerminalState::default(),
            test_cases,
            stage_index: 0,
            stage_timestamps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Folds one event payload into the projection.
    ///
    /// Stage advances are not evented, so replay does not move the stage
    /// pointer. Executed-run events cannot recover the measured execution
    /// time, so replay leaves it unset.
    pub fn apply_event(&mut self, payload: &EventPayload) {
        match payload {
            EventPayload::ContentChanged { after, .. } => {
                self.editor.content.clone_from(after);
            }
            EventPayload::TestcaseChanged { after, .. } => {
                self.test_cases.clone_from(after);
            }
            EventPayload::UserTestcaseExecuted { test_results }
            | EventPayload::GroundtruthTestcaseExecuted { test_results } => {
                self.terminal = TerminalState::from_results(test_results, None);
            }
            EventPayload::QuestionDisplayed { .. } => {}
        }
    }
}

/// Reconstructs the final projection by folding an ordered event slice over
/// an initial projection.
pub fn replay_events(mut initial: SessionState, events: &[SessionEvent]) -> SessionState {
    for event in events {
        initial.apply_event(&event.payload);
    }
    initial
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(n: i64) -> TestCase {
        let mut input = HashMap::new();
        input.insert("n".to_string(), json!(n));
        TestCase {
            input,
            expected_output: Some(json!(n * 2)),
        }
    }

    #[test]
    fn test_new_state_seeds_editor_and_cases() {
        let session_id = Uuid::new_v4();
        let state = SessionState::new(session_id, "python", "def f(): pass", vec![case(1)]);

        assert_eq!(state.session_id, session_id);
        assert_eq!(state.editor.language, "python");
        assert_eq!(state.editor.content, "def f(): pass");
        assert_eq!(state.test_cases.len(), 1);
        assert_eq!(state.stage_index, 0);
        assert!(state.stage_timestamps.is_empty());
        assert!(state.terminal.output.is_empty());
    }

    #[test]
    fn test_apply_content_changed() {
        let mut state = SessionState::new(Uuid::new_v4(), "python", "", vec![]);
        state.apply_event(&EventPayload::ContentChanged {
            before: String::new(),
            after: "def f(): return 1".to_string(),
        });
        assert_eq!(state.editor.content, "def f(): return 1");
    }

    #[test]
    fn test_apply_testcase_changed() {
        let mut state = SessionState::new(Uuid::new_v4(), "python", "", vec![case(1)]);
        state.apply_event(&EventPayload::TestcaseChanged {
            before: vec![case(1)],
            after: vec![case(1), case(2)],
        });
        assert_eq!(state.test_cases.len(), 2);
    }

    #[test]
    fn test_apply_run_rebuilds_terminal() {
        let mut state = SessionState::new(Uuid::new_v4(), "python", "", vec![]);
        let results = vec![TestCaseResult {
            case_number: 1,
            passed: false,
            input: HashMap::new(),
            expected: json!(2),
            actual: json!(3),
            error: Some("AssertionError".to_string()),
            stdout: None,
        }];
        state.apply_event(&EventPayload::UserTestcaseExecuted {
            test_results: results.clone(),
        });
        assert_eq!(state.terminal, TerminalState::from_results(&results, None));
        assert!(state.terminal.is_error);
        assert!(state.terminal.output.starts_with("0/1 test cases passed"));
    }

    #[test]
    fn test_replay_folds_in_order() {
        let initial = SessionState::new(Uuid::new_v4(), "python", "", vec![]);
        let state_id = initial.id;
        let events: Vec<SessionEvent> = ["a", "ab", "abc"]
            .iter()
            .enumerate()
            .map(|(i, after)| SessionEvent {
                id: Uuid::new_v4(),
                state_id,
                seq: i64::try_from(i).unwrap() + 1,
                payload: EventPayload::ContentChanged {
                    before: String::new(),
                    after: (*after).to_string(),
                },
                acknowledged: false,
                created_at: Utc::now(),
            })
            .collect();

        let replayed = replay_events(initial, &events);
        assert_eq!(replayed.editor.content, "abc");
    }

    #[test]
    fn test_testcase_wire_field_name() {
        let value = serde_json::to_value(case(2)).unwrap();
        assert_eq!(value["expectedOutput"], json!(4));
        assert!(value.as_object().unwrap().contains_key("input"));
    }
}
