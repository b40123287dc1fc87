/// Question provider port.
///
/// The question bank is an external collaborator; the core reads a question
/// once, at session creation.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::QuestionSpec;

#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Fetches the spec for a question id.
    ///
    /// # Errors
    /// `QuestionNotFound` when the id is unknown.
    async fn get_question(&self, id: Uuid) -> DomainResult<QuestionSpec>;
}
