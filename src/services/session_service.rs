//! Session lifecycle service.
//!
//! Coordinates session creation, the three-state lifecycle, deadline
//! registration, evaluation-job enqueueing, and the minutes debit on
//! user-triggered completion.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EvaluationJob, Session, SessionStatus};
use crate::domain::ports::{
    EvaluationJobRepository, MinutesLedger, QuestionProvider, SessionRepository,
};

use super::scheduler::DeadlineTable;
use super::state_store::StateStore;

/// Which path completed a session. Deadline completion is idempotent and
/// never bills; user completion is loud on re-entry and debits minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndOrigin {
    User,
    Deadline,
}

pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    state_store: Arc<StateStore>,
    questions: Arc<dyn QuestionProvider>,
    jobs: Arc<dyn EvaluationJobRepository>,
    ledger: Arc<dyn MinutesLedger>,
    deadlines: Arc<DeadlineTable>,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        state_store: Arc<StateStore>,
        questions: Arc<dyn QuestionProvider>,
        jobs: Arc<dyn EvaluationJobRepository>,
        ledger: Arc<dyn MinutesLedger>,
        deadlines: Arc<DeadlineTable>,
    ) -> Self {
        Self {
            sessions,
            state_store,
            questions,
            jobs,
            ledger,
            deadlines,
        }
    }

    /// Creates a session plus its one-to-one state record, seeded from the
    /// assigned question (initial code template and first test cases).
    ///
    /// # Errors
    /// `ActiveSessionExists` when the user already has a session that is
    /// NotStarted or InProgress.
    #[instrument(skip(self, flow), err)]
    pub async fn create_session(
        &self,
        user_id: &str,
        question_id: Uuid,
        language: &str,
        flow: Vec<String>,
        time_limit_minutes: u32,
    ) -> DomainResult<Session> {
        if let Some(active) = self.sessions.find_active_for_user(user_id).await? {
            return Err(DomainError::ActiveSessionExists {
                user_id: user_id.to_string(),
                session_id: active.id,
            });
        }

        let question = self.questions.get_question(question_id).await?;
        let template = question.render_template(language);
        let seeds = question.seed_test_cases();

        let session = Session::new(user_id, question_id, flow, time_limit_minutes);
        self.sessions.create(&session).await?;
        self.state_store
            .create_for_session(session.id, language, &template, seeds)
            .await?;

        info!(session_id = %session.id, user_id, "session created");
        Ok(session)
    }

    pub async fn get_session(&self, id: Uuid) -> DomainResult<Option<Session>> {
        self.sessions.get(id).await
    }

    async fn require_session(&self, id: Uuid) -> DomainResult<Session> {
        self.sessions
            .get(id)
            .await?
            .ok_or(DomainError::SessionNotFound(id))
    }

    /// Starts a session.
    ///
    /// Idempotent: re-entering an InProgress session confirms it without
    /// touching the start time or registering a second deadline. Only the
    /// first NotStarted -> InProgress edge fixes `started_at` and registers
    /// the forced-completion deadline.
    ///
    /// # Errors
    /// `AlreadyCompleted` when the session has already ended.
    #[instrument(skip(self), err)]
    pub async fn start_session(&self, id: Uuid) -> DomainResult<Session> {
        let mut session = self.require_session(id).await?;

        match session.status {
            SessionStatus::Completed => Err(DomainError::AlreadyCompleted(id)),
            SessionStatus::InProgress => Ok(session),
            SessionStatus::NotStarted => {
                session.status = SessionStatus::InProgress;
                session.started_at = Some(Utc::now());
                self.sessions.update(&session).await?;

                // deadline() is Some here, started_at was just fixed
                if let Some(due_at) = session.deadline() {
                    self.deadlines.register(id, due_at).await;
                }
                info!(session_id = %id, deadline = ?session.deadline(), "session started");
                Ok(session)
            }
        }
    }

    /// User-triggered completion. Debits elapsed whole minutes (floored)
    /// from the user's balance when the session was actually started.
    ///
    /// # Errors
    /// `AlreadyCompleted` when the session already ended — the user must be
    /// told about a double-submit. `EvaluationJobExists` when a job was
    /// already enqueued, which signals a double-completion bug.
    #[instrument(skip(self), err)]
    pub async fn end_session(&self, id: Uuid) -> DomainResult<Session> {
        self.complete(id, EndOrigin::User).await
    }

    /// Deadline-triggered completion. A no-op `Ok` on an already-completed
    /// session, because the scheduler primitive delivers at least once.
    #[instrument(skip(self), err)]
    pub async fn force_end_session(&self, id: Uuid) -> DomainResult<Session> {
        self.complete(id, EndOrigin::Deadline).await
    }

    async fn complete(&self, id: Uuid, origin: EndOrigin) -> DomainResult<Session> {
        let mut session = self.require_session(id).await?;

        if session.status == SessionStatus::Completed {
            return match origin {
                EndOrigin::User => Err(DomainError::AlreadyCompleted(id)),
                EndOrigin::Deadline => Ok(session),
            };
        }

        session.status = SessionStatus::Completed;
        if session.ended_at.is_none() {
            // first writer wins
            session.ended_at = Some(Utc::now());
        }
        self.sessions.update(&session).await?;

        // Exactly one evaluation job per session; a duplicate here is a
        // double-completion bug and must surface to the caller. A failed
        // insert leaves the session jobless until the scheduler sweep
        // re-enqueues it.
        self.jobs.create(&EvaluationJob::new(id)).await?;

        if origin == EndOrigin::User {
            self.debit_elapsed(&session).await;
        }

        info!(session_id = %id, ?origin, "session completed");
        Ok(session)
    }

    /// Floors elapsed time to whole minutes before debiting, so partial
    /// minutes are not billed. Ledger failures are logged, not propagated:
    /// completion must not be rolled back over a billing hiccup.
    async fn debit_elapsed(&self, session: &Session) {
        match session.elapsed_whole_minutes() {
            Some(minutes) if minutes > 0 => {
                if let Err(e) = self.ledger.debit(&session.user_id, minutes).await {
                    warn!(
                        session_id = %session.id,
                        user_id = %session.user_id,
                        minutes,
                        error = %e,
                        "minutes debit failed"
                    );
                }
            }
            _ => {}
        }
    }
}
