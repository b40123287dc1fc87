//! SQLite implementation of the SessionRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Session, SessionStatus};
use crate::domain::ports::SessionRepository;

use super::{parse_datetime, parse_optional_datetime, parse_uuid};

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &Session) -> DomainResult<()> {
        let flow_json = serde_json::to_string(&session.flow)?;

        let result = sqlx::query(
            r#"INSERT INTO sessions (id, user_id, question_id, status, flow,
               time_limit_minutes, started_at, ended_at, evaluation_ready, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.user_id)
        .bind(session.question_id.to_string())
        .bind(session.status.as_str())
        .bind(&flow_json)
        .bind(i64::from(session.time_limit_minutes))
        .bind(session.started_at.map(|t| t.to_rfc3339()))
        .bind(session.ended_at.map(|t| t.to_rfc3339()))
        .bind(i32::from(session.evaluation_ready))
        .bind(session.created_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // The partial unique index on active sessions rejects the loser
            // of a racing create; resolve it to the surviving session's id.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                match self.find_active_for_user(&session.user_id).await? {
                    Some(active) => Err(DomainError::ActiveSessionExists {
                        user_id: session.user_id.clone(),
                        session_id: active.id,
                    }),
                    None => Err(DomainError::DatabaseError(db.message().to_string())),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as("SELECT * FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Session::try_from).transpose()
    }

    async fn update(&self, session: &Session) -> DomainResult<()> {
        let flow_json = serde_json::to_string(&session.flow)?;

        let result = sqlx::query(
            r#"UPDATE sessions SET user_id = ?, question_id = ?, status = ?, flow = ?,
               time_limit_minutes = ?, started_at = ?, ended_at = ?, evaluation_ready = ?,
               updated_at = ? WHERE id = ?"#,
        )
        .bind(&session.user_id)
        .bind(session.question_id.to_string())
        .bind(session.status.as_str())
        .bind(&flow_json)
        .bind(i64::from(session.time_limit_minutes))
        .bind(session.started_at.map(|t| t.to_rfc3339()))
        .bind(session.ended_at.map(|t| t.to_rfc3339()))
        .bind(i32::from(session.evaluation_ready))
        .bind(Utc::now().to_rfc3339())
        .bind(session.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::SessionNotFound(session.id));
        }
        Ok(())
    }

    async fn find_active_for_user(&self, user_id: &str) -> DomainResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT * FROM sessions
             WHERE user_id = ? AND status IN ('not_started', 'in_progress')
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Session::try_from).transpose()
    }

    async fn list_by_status(&self, status: SessionStatus) -> DomainResult<Vec<Session>> {
        let rows: Vec<SessionRow> =
            sqlx::query_as("SELECT * FROM sessions WHERE status = ? ORDER BY created_at ASC")
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Session::try_from).collect()
    }

    async fn set_evaluation_ready(&self, id: Uuid) -> DomainResult<()> {
        let result =
            sqlx::query("UPDATE sessions SET evaluation_ready = 1, updated_at = ? WHERE id = ?")
                .bind(Utc::now().to_rfc3339())
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::SessionNotFound(id));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    question_id: String,
    status: String,
    flow: String,
    time_limit_minutes: i64,
    started_at: Option<String>,
    ended_at: Option<String>,
    evaluation_ready: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SessionRow> for Session {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> DomainResult<Self> {
        let status = SessionStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown session status: {}", row.status))
        })?;
        let flow: Vec<String> = serde_json::from_str(&row.flow)?;

        Ok(Session {
            id: parse_uuid(&row.id)?,
            user_id: row.user_id,
            question_id: parse_uuid(&row.question_id)?,
            status,
            flow,
            time_limit_minutes: u32::try_from(row.time_limit_minutes)
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            started_at: parse_optional_datetime(row.started_at)?,
            ended_at: parse_optional_datetime(row.ended_at)?,
            evaluation_ready: row.evaluation_ready != 0,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
