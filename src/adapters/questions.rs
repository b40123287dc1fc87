//! In-memory question provider.
//!
//! Fixture/bench/test adapter for the question-bank boundary. Production
//! hosts plug in their own provider backed by whatever stores their
//! question content.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::QuestionSpec;
use crate::domain::ports::QuestionProvider;

#[derive(Default)]
pub struct StaticQuestionProvider {
    questions: RwLock<HashMap<Uuid, QuestionSpec>>,
}

impl StaticQuestionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a question under the given id, replacing any previous spec.
    pub async fn insert(&self, id: Uuid, spec: QuestionSpec) {
        self.questions.write().await.insert(id, spec);
    }
}

#[async_trait]
impl QuestionProvider for StaticQuestionProvider {
    async fn get_question(&self, id: Uuid) -> DomainResult<QuestionSpec> {
        self.questions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DomainError::QuestionNotFound(id))
    }
}
