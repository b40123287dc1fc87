//! Evaluation job domain model.
//!
//! One job per completed session, created at completion time and dispatched
//! by the scheduler's periodic sweep. The PRIMARY KEY on session id enforces
//! at-most-one job per session; duplicate creation is a loud error, not an
//! upsert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an evaluation job.
///
/// Wire names are camelCase (`inProgress`, `timeOut`) because downstream
/// tooling reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationJobStatus {
    /// Waiting for a sweep pass to claim it
    #[default]
    #[serde(rename = "pending")]
    Pending,
    /// Claimed by a sweep; dispatch is outstanding
    #[serde(rename = "inProgress")]
    InProgress,
    /// The external evaluator produced a result
    #[serde(rename = "success")]
    Success,
    /// Retry budget exhausted (terminal)
    #[serde(rename = "failed")]
    Failed,
    /// Claimed but never resolved within the evaluation timeout (terminal)
    #[serde(rename = "timeOut")]
    TimeOut,
}

impl EvaluationJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "inProgress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::TimeOut => "timeOut",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "inProgress" => Some(Self::InProgress),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "timeOut" => Some(Self::TimeOut),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::TimeOut)
    }
}

/// Queued unit of work: "produce a scored evaluation for this session".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationJob {
    /// Owning session; doubles as the job's identity
    pub session_id: Uuid,

    pub status: EvaluationJobStatus,

    /// Dispatch attempts so far; the sweep marks the job Failed once this
    /// reaches the configured budget
    pub attempts: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl EvaluationJob {
    pub fn new(session_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            status: EvaluationJobStatus::Pending,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
