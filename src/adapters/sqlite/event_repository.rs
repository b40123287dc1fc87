//! SQLite implementation of the EventRepository.
//!
//! Events are append-only rows; the AUTOINCREMENT `seq` column assigns the
//! log's total order at insert time.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EventPayload, SessionEvent};
use crate::domain::ports::EventRepository;

use super::{parse_datetime, parse_uuid};

#[derive(Clone)]
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn append(&self, state_id: Uuid, payload: &EventPayload) -> DomainResult<SessionEvent> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let payload_json = serde_json::to_string(payload)?;

        let result = sqlx::query(
            "INSERT INTO session_events (id, state_id, payload, acknowledged, created_at)
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(id.to_string())
        .bind(state_id.to_string())
        .bind(&payload_json)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(SessionEvent {
            id,
            state_id,
            seq: result.last_insert_rowid(),
            payload: payload.clone(),
            acknowledged: false,
            created_at,
        })
    }

    async fn list_by_state(&self, state_id: Uuid) -> DomainResult<Vec<SessionEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT seq, id, state_id, payload, acknowledged, created_at
             FROM session_events WHERE state_id = ? ORDER BY seq ASC",
        )
        .bind(state_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SessionEvent::try_from).collect()
    }

    async fn list_by_session(&self, session_id: Uuid) -> DomainResult<Vec<SessionEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT e.seq, e.id, e.state_id, e.payload, e.acknowledged, e.created_at
             FROM session_events e
             JOIN session_states s ON e.state_id = s.id
             WHERE s.session_id = ? ORDER BY e.seq ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SessionEvent::try_from).collect()
    }

    async fn acknowledge(&self, event_id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("UPDATE session_events SET acknowledged = 1 WHERE id = ?")
            .bind(event_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::DatabaseError(format!(
                "event not found: {event_id}"
            )));
        }
        Ok(())
    }

    async fn count_for_state(&self, state_id: Uuid) -> DomainResult<u64> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM session_events WHERE state_id = ?")
                .bind(state_id.to_string())
                .fetch_one(&self.pool)
                .await?;

        Ok(u64::try_from(result.0).unwrap_or(0))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    seq: i64,
    id: String,
    state_id: String,
    payload: String,
    acknowledged: i64,
    created_at: String,
}

impl TryFrom<EventRow> for SessionEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> DomainResult<Self> {
        Ok(SessionEvent {
            id: parse_uuid(&row.id)?,
            state_id: parse_uuid(&row.state_id)?,
            seq: row.seq,
            payload: serde_json::from_str(&row.payload)?,
            acknowledged: row.acknowledged != 0,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
