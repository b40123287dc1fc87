//! Session event domain model.
//!
//! Events are the append-only behavioral record of a session: every committed
//! state-changing action produces exactly one event. The log is never mutated
//! or pruned; it feeds the evaluation consumer and audit/replay tooling.
//!
//! The serialized form of [`EventPayload`] is a wire-level contract that
//! external tooling depends on. Tag strings and field names are asserted
//! literally in tests; do not rename them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::state::TestCase;

/// Outcome of running one test case, as recorded by the run recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    /// 1-based case number as shown to the candidate
    pub case_number: u32,

    pub passed: bool,

    /// Parameter name -> value mapping the case ran with
    pub input: HashMap<String, Value>,

    pub expected: Value,

    pub actual: Value,

    /// Runtime error text, null when the case executed cleanly
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
}

/// Discriminated payload of a session event.
///
/// Serializes as `{"type": "...", "data": {...}}` with snake_case type tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full editor text before and after a committed edit window
    ContentChanged { before: String, after: String },

    /// Full test case list before and after an explicit save
    TestcaseChanged {
        before: Vec<TestCase>,
        after: Vec<TestCase>,
    },

    /// Candidate-authored test cases were executed
    UserTestcaseExecuted {
        #[serde(rename = "testResults")]
        test_results: Vec<TestCaseResult>,
    },

    /// Stored ground-truth test cases were executed
    GroundtruthTestcaseExecuted {
        #[serde(rename = "testResults")]
        test_results: Vec<TestCaseResult>,
    },

    /// The question text was shown or hidden
    QuestionDisplayed { displayed: bool },
}

impl EventPayload {
    /// The wire-level type tag of this payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentChanged { .. } => "content_changed",
            Self::TestcaseChanged { .. } => "testcase_changed",
            Self::UserTestcaseExecuted { .. } => "user_testcase_executed",
            Self::GroundtruthTestcaseExecuted { .. } => "groundtruth_testcase_executed",
            Self::QuestionDisplayed { .. } => "question_displayed",
        }
    }
}

/// One immutable entry in a session's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Unique event identifier
    pub id: Uuid,

    /// Owning session-state record
    pub state_id: Uuid,

    /// Storage-assigned insertion order. The log's order is this sequence.
    pub seq: i64,

    pub payload: EventPayload,

    /// Set by the voice agent after it has consumed the event
    pub acknowledged: bool,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_kind_matches_serialized_tag() {
        let payloads = vec![
            EventPayload::ContentChanged {
                before: String::new(),
                after: "x".to_string(),
            },
            EventPayload::TestcaseChanged {
                before: vec![],
                after: vec![],
            },
            EventPayload::UserTestcaseExecuted { test_results: vec![] },
            EventPayload::GroundtruthTestcaseExecuted { test_results: vec![] },
            EventPayload::QuestionDisplayed { displayed: true },
        ];

        for payload in payloads {
            let value = serde_json::to_value(&payload).unwrap();
            assert_eq!(value["type"], json!(payload.kind()));
        }
    }

    #[test]
    fn test_payload_round_trip() {
        let payload = EventPayload::ContentChanged {
            before: "def f(): pass".to_string(),
            after: "def f(): return 1".to_string(),
        };
        let text = serde_json::to_string(&payload).unwrap();
        let back: EventPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_result_serializes_null_error() {
        let result = TestCaseResult {
            case_number: 1,
            passed: true,
            input: HashMap::new(),
            expected: json!(3),
            actual: json!(3),
            error: None,
            stdout: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        // error is part of the wire shape even when null; stdout is optional
        assert!(value.as_object().unwrap().contains_key("error"));
        assert!(!value.as_object().unwrap().contains_key("stdout"));
        assert_eq!(value["caseNumber"], json!(1));
    }
}
