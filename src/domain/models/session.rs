//! Session domain model.
//!
//! A session is one candidate's attempt at one interview question. Its
//! lifecycle is a three-state machine driven by the session service and the
//! deadline scheduler.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session created but the candidate has not pressed start yet
    NotStarted,
    /// Session is running; the deadline clock is ticking
    InProgress,
    /// Session ended, either by the candidate or by the deadline (terminal)
    Completed,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "completed" | "complete" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if this status counts against the one-active-session-per-user
    /// invariant.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Valid transitions from this status.
    ///
    /// NotStarted -> Completed covers a session abandoned before it was ever
    /// started; no billing applies because no start time exists.
    pub fn valid_transitions(&self) -> Vec<SessionStatus> {
        match self {
            Self::NotStarted => vec![Self::InProgress, Self::Completed],
            Self::InProgress => vec![Self::Completed],
            Self::Completed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// One interview attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: Uuid,

    /// Owning user (opaque external auth identifier)
    pub user_id: String,

    /// Assigned question
    pub question_id: Uuid,

    /// Current lifecycle status
    pub status: SessionStatus,

    /// Ordered stage names of the interview flow
    /// (e.g. ["introduction", "coding", "evaluation"])
    pub flow: Vec<String>,

    /// Configured time limit in minutes
    pub time_limit_minutes: u32,

    /// Fixed at the first NotStarted -> InProgress transition
    pub started_at: Option<DateTime<Utc>>,

    /// Fixed by whichever completion path runs first
    pub ended_at: Option<DateTime<Utc>>,

    /// Set by the external evaluation result writer once a scored
    /// evaluation is available
    pub evaluation_ready: bool,

    /// Session creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session in the NotStarted state.
    pub fn new(
        user_id: impl Into<String>,
        question_id: Uuid,
        flow: Vec<String>,
        time_limit_minutes: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            question_id,
            status: SessionStatus::NotStarted,
            flow,
            time_limit_minutes,
            started_at: None,
            ended_at: None,
            evaluation_ready: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The forced-completion deadline, once the session has been started.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .map(|start| start + Duration::minutes(i64::from(self.time_limit_minutes)))
    }

    /// Elapsed whole minutes between start and end, floored.
    ///
    /// Partial minutes are not billed. This matches the observed billing
    /// behavior; see DESIGN.md before changing it.
    pub fn elapsed_whole_minutes(&self) -> Option<u32> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => {
                let millis = end.signed_duration_since(start).num_milliseconds().max(0);
                u32::try_from(millis / 60_000).ok()
            }
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let question_id = Uuid::new_v4();
        let session = Session::new("alice", question_id, vec!["coding".to_string()], 45);

        assert_eq!(session.user_id, "alice");
        assert_eq!(session.question_id, question_id);
        assert_eq!(session.status, SessionStatus::NotStarted);
        assert_eq!(session.time_limit_minutes, 45);
        assert!(session.started_at.is_none());
        assert!(session.ended_at.is_none());
        assert!(!session.evaluation_ready);
    }

    #[test]
    fn test_status_transitions() {
        assert!(SessionStatus::NotStarted.can_transition_to(SessionStatus::InProgress));
        assert!(SessionStatus::NotStarted.can_transition_to(SessionStatus::Completed));
        assert!(SessionStatus::InProgress.can_transition_to(SessionStatus::Completed));
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::InProgress));
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::NotStarted));
        assert!(!SessionStatus::InProgress.can_transition_to(SessionStatus::NotStarted));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            SessionStatus::NotStarted,
            SessionStatus::InProgress,
            SessionStatus::Completed,
        ] {
            assert_eq!(SessionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_deadline_requires_start() {
        let mut session = Session::new("alice", Uuid::new_v4(), vec![], 30);
        assert!(session.deadline().is_none());

        let start = Utc::now();
        session.started_at = Some(start);
        assert_eq!(session.deadline(), Some(start + Duration::minutes(30)));
    }

    #[test]
    fn test_elapsed_whole_minutes_floors() {
        let mut session = Session::new("alice", Uuid::new_v4(), vec![], 30);
        let start = Utc::now();
        session.started_at = Some(start);

        // 2 minutes 59 seconds floors to 2
        session.ended_at = Some(start + Duration::seconds(179));
        assert_eq!(session.elapsed_whole_minutes(), Some(2));

        // 59 seconds floors to 0
        session.ended_at = Some(start + Duration::seconds(59));
        assert_eq!(session.elapsed_whole_minutes(), Some(0));

        session.ended_at = None;
        assert_eq!(session.elapsed_whole_minutes(), None);
    }
}
