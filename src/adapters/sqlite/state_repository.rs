//! SQLite implementation of the StateRepository.
//!
//! Editor/terminal sub-records, test cases, and stage timestamps are stored
//! as JSON TEXT columns; the UNIQUE(session_id) constraint is the
//! check-and-create guard for the one-state-per-session invariant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EditorState, SessionState, TerminalState, TestCase};
use crate::domain::ports::StateRepository;

use super::{parse_datetime, parse_uuid};

#[derive(Clone)]
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

impl SqliteStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn touch(&self, session_id: Uuid, column: &str, json: String) -> DomainResult<()> {
        // column names come from a fixed internal set, never from input
        let sql = format!("UPDATE session_states SET {column} = ?, updated_at = ? WHERE session_id = ?");
        let result = sqlx::query(&sql)
            .bind(json)
            .bind(Utc::now().to_rfc3339())
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::StateNotFound(session_id));
        }
        Ok(())
    }
}

#[async_trait]
impl StateRepository for SqliteStateRepository {
    async fn create(&self, state: &SessionState) -> DomainResult<()> {
        let editor_json = serde_json::to_string(&state.editor)?;
        let terminal_json = serde_json::to_string(&state.terminal)?;
        let cases_json = serde_json::to_string(&state.test_cases)?;
        let timestamps_json = serde_json::to_string(&state.stage_timestamps)?;

        let result = sqlx::query(
            r#"INSERT INTO session_states (id, session_id, editor, terminal, test_cases,
               stage_index, stage_timestamps, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(state.id.to_string())
        .bind(state.session_id.to_string())
        .bind(&editor_json)
        .bind(&terminal_json)
        .bind(&cases_json)
        .bind(i64::from(state.stage_index))
        .bind(&timestamps_json)
        .bind(state.created_at.to_rfc3339())
        .bind(state.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::StateAlreadyExists(state.session_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_session(&self, session_id: Uuid) -> DomainResult<Option<SessionState>> {
        let row: Option<StateRow> =
            sqlx::query_as("SELECT * FROM session_states WHERE session_id = ?")
                .bind(session_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(SessionState::try_from).transpose()
    }

    async fn update_editor(&self, session_id: Uuid, editor: &EditorState) -> DomainResult<()> {
        self.touch(session_id, "editor", serde_json::to_string(editor)?)
            .await
    }

    async fn update_terminal(
        &self,
        session_id: Uuid,
        terminal: &TerminalState,
    ) -> DomainResult<()> {
        self.touch(session_id, "terminal", serde_json::to_string(terminal)?)
            .await
    }

    async fn update_test_cases(&self, session_id: Uuid, cases: &[TestCase]) -> DomainResult<()> {
        self.touch(session_id, "test_cases", serde_json::to_string(cases)?)
            .await
    }

    async fn update_stage(
        &self,
        session_id: Uuid,
        index: u32,
        timestamps: &[DateTime<Utc>],
    ) -> DomainResult<()> {
        let timestamps_json = serde_json::to_string(timestamps)?;
        let result = sqlx::query(
            "UPDATE session_states SET stage_index = ?, stage_timestamps = ?, updated_at = ?
             WHERE session_id = ?",
        )
        .bind(i64::from(index))
        .bind(&timestamps_json)
        .bind(Utc::now().to_rfc3339())
        .bind(session_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::StateNotFound(session_id));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StateRow {
    id: String,
    session_id: String,
    editor: String,
    terminal: String,
    test_cases: String,
    stage_index: i64,
    stage_timestamps: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<StateRow> for SessionState {
    type Error = DomainError;

    fn try_from(row: StateRow) -> DomainResult<Self> {
        Ok(SessionState {
            id: parse_uuid(&row.id)?,
            session_id: parse_uuid(&row.session_id)?,
            editor: serde_json::from_str(&row.editor)?,
            terminal: serde_json::from_str(&row.terminal)?,
            test_cases: serde_json::from_str(&row.test_cases)?,
            stage_index: u32::try_from(row.stage_index)
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            stage_timestamps: serde_json::from_str(&row.stage_timestamps)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
