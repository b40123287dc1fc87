/// Evaluation job repository port.
///
/// The Pending -> InProgress compare-and-set (`try_claim`) is the only
/// de-duplication gate between overlapping sweep passes.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::EvaluationJob;

#[async_trait]
pub trait EvaluationJobRepository: Send + Sync {
    /// Inserts a new job.
    ///
    /// # Errors
    /// `EvaluationJobExists` when a job for the session already exists.
    /// Duplicate creation signals a double-completion bug and must surface.
    async fn create(&self, job: &EvaluationJob) -> DomainResult<()>;

    /// Fetches the job for a session.
    async fn get(&self, session_id: Uuid) -> DomainResult<Option<EvaluationJob>>;

    /// All jobs currently in the Pending state.
    async fn list_pending(&self) -> DomainResult<Vec<EvaluationJob>>;

    /// Atomically moves the job Pending -> InProgress.
    ///
    /// Returns false when the job was not Pending (already claimed, or
    /// terminal), in which case the caller must not dispatch.
    async fn try_claim(&self, session_id: Uuid) -> DomainResult<bool>;

    /// Releases a claimed job back to Pending and increments its attempt
    /// counter. Used after a transient dispatch failure.
    async fn release(&self, session_id: Uuid) -> DomainResult<()>;

    /// Marks the job Failed (terminal). Only the sweep decides this, after
    /// the retry budget is exhausted.
    async fn mark_failed(&self, session_id: Uuid) -> DomainResult<()>;

    /// Marks the job Success (terminal). Called by the external result
    /// writer when the evaluation lands.
    async fn mark_succeeded(&self, session_id: Uuid) -> DomainResult<()>;

    /// Marks InProgress jobs last updated before `cutoff` as TimeOut.
    /// Returns the number of jobs affected.
    async fn mark_timed_out_stale(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;
}
