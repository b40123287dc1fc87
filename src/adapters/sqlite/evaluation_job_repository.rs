//! SQLite implementation of the EvaluationJobRepository.
//!
//! `try_claim` is a single UPDATE guarded by `status = 'pending'`, which is
//! the compare-and-set that keeps overlapping sweeps from double-dispatching.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EvaluationJob, EvaluationJobStatus};
use crate::domain::ports::EvaluationJobRepository;

use super::{parse_datetime, parse_uuid};

#[derive(Clone)]
pub struct SqliteEvaluationJobRepository {
    pool: SqlitePool,
}

impl SqliteEvaluationJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn set_status(
        &self,
        session_id: Uuid,
        status: EvaluationJobStatus,
    ) -> DomainResult<()> {
        let result =
            sqlx::query("UPDATE evaluation_jobs SET status = ?, updated_at = ? WHERE session_id = ?")
                .bind(status.as_str())
                .bind(Utc::now().to_rfc3339())
                .bind(session_id.to_string())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EvaluationJobNotFound(session_id));
        }
        Ok(())
    }
}

#[async_trait]
impl EvaluationJobRepository for SqliteEvaluationJobRepository {
    async fn create(&self, job: &EvaluationJob) -> DomainResult<()> {
        let result = sqlx::query(
            "INSERT INTO evaluation_jobs (session_id, status, attempts, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(job.session_id.to_string())
        .bind(job.status.as_str())
        .bind(i64::from(job.attempts))
        .bind(job.created_at.to_rfc3339())
        .bind(job.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::EvaluationJobExists(job.session_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, session_id: Uuid) -> DomainResult<Option<EvaluationJob>> {
        let row: Option<JobRow> =
            sqlx::query_as("SELECT * FROM evaluation_jobs WHERE session_id = ?")
                .bind(session_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(EvaluationJob::try_from).transpose()
    }

    async fn list_pending(&self) -> DomainResult<Vec<EvaluationJob>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            "SELECT * FROM evaluation_jobs WHERE status = 'pending' ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EvaluationJob::try_from).collect()
    }

    async fn try_claim(&self, session_id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query(
            "UPDATE evaluation_jobs SET status = 'inProgress', updated_at = ?
             WHERE session_id = ? AND status = 'pending'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(session_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, session_id: Uuid) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE evaluation_jobs SET status = 'pending', attempts = attempts + 1, updated_at = ?
             WHERE session_id = ? AND status = 'inProgress'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(session_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EvaluationJobNotFound(session_id));
        }
        Ok(())
    }

    async fn mark_failed(&self, session_id: Uuid) -> DomainResult<()> {
        self.set_status(session_id, EvaluationJobStatus::Failed).await
    }

    async fn mark_succeeded(&self, session_id: Uuid) -> DomainResult<()> {
        self.set_status(session_id, EvaluationJobStatus::Success).await
    }

    async fn mark_timed_out_stale(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE evaluation_jobs SET status = 'timeOut', updated_at = ?
             WHERE status = 'inProgress' AND updated_at < ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(cutoff.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    session_id: String,
    status: String,
    attempts: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<JobRow> for EvaluationJob {
    type Error = DomainError;

    fn try_from(row: JobRow) -> DomainResult<Self> {
        let status = EvaluationJobStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown job status: {}", row.status))
        })?;

        Ok(EvaluationJob {
            session_id: parse_uuid(&row.session_id)?,
            status,
            attempts: u32::try_from(row.attempts)
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
