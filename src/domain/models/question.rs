//! Question boundary types.
//!
//! The question provider is an external collaborator; the core reads a
//! question exactly once at session creation to seed the initial editor
//! content and the first test cases.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::state::TestCase;

/// Number of question tests copied into a fresh session's working set.
pub const SEED_TEST_CASE_COUNT: usize = 3;

/// One stored ground-truth test of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTest {
    /// Parameter name -> value mapping
    pub input: HashMap<String, Value>,

    /// Expected output
    pub output: Value,
}

/// What the question provider returns for a question id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Name of the function the candidate implements
    pub function_name: String,

    /// Language -> ordered parameter names
    pub input_parameters: HashMap<String, Vec<String>>,

    /// Ground-truth tests, in authoring order
    pub tests: Vec<QuestionTest>,

    /// How the evaluator scores this question (opaque to the core)
    pub eval_mode: String,
}

impl QuestionSpec {
    /// Parameter names for a language, falling back to an empty list when the
    /// question was not authored for that language.
    pub fn params_for(&self, language: &str) -> Vec<String> {
        self.input_parameters
            .get(language)
            .cloned()
            .unwrap_or_default()
    }

    /// The first [`SEED_TEST_CASE_COUNT`] tests, mapped into session test
    /// cases.
    pub fn seed_test_cases(&self) -> Vec<TestCase> {
        self.tests
            .iter()
            .take(SEED_TEST_CASE_COUNT)
            .map(|t| TestCase {
                input: t.input.clone(),
                expected_output: Some(t.output.clone()),
            })
            .collect()
    }

    /// Renders the empty function skeleton used as initial editor content.
    pub fn render_template(&self, language: &str) -> String {
        let params = self.params_for(language).join(", ");
        let name = &self.function_name;
        match language {
            "python" => format!("def {name}({params}):\n    pass\n"),
            "javascript" | "typescript" => format!("function {name}({params}) {{\n\n}}\n"),
            "rust" => format!("fn {name}({params}) {{\n    todo!()\n}}\n"),
            _ => format!("// Implement {name}({params})\n"),
        }
    }
}
