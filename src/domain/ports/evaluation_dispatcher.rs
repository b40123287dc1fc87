/// Evaluation dispatcher port.
///
/// Opaque external call that triggers evaluation of a completed session.
/// Success or failure of the evaluation itself is observed asynchronously
/// through the session's evaluation-ready flag, written by a separate writer.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait EvaluationDispatcher: Send + Sync {
    /// Triggers evaluation of one completed session.
    ///
    /// # Errors
    /// `DispatchFailed` on transport or endpoint errors. The sweep treats
    /// this as transient and requeues the job.
    async fn dispatch(&self, session_id: Uuid) -> DomainResult<()>;
}
