//! Lifecycle scheduler: deadline enforcement and the evaluation sweep.
//!
//! An in-process table of one deadline per started session drives forced
//! completion; a periodic sweep recovers stale evaluation claims and
//! dispatches pending jobs to the evaluation backend. Both run on one tick
//! loop so a single task owns all background lifecycle work.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EvaluationJob, SchedulerConfig, SessionStatus};
use crate::domain::ports::{EvaluationDispatcher, EvaluationJobRepository, SessionRepository};

use super::session_service::SessionService;

/// One registered forced-completion deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub session_id: Uuid,
    pub due_at: DateTime<Utc>,
}

/// Shared in-process deadline registry.
///
/// The session service registers on the start edge; the scheduler drains due
/// entries every tick. Kept as a plain scanned vec: the population is bounded
/// by concurrently running interviews, never large enough to warrant a heap.
#[derive(Default)]
pub struct DeadlineTable {
    entries: RwLock<Vec<Deadline>>,
}

impl DeadlineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deadline. Returns false (and keeps the existing entry)
    /// when the session already has one, so re-entrant starts cannot arm a
    /// second timer.
    pub async fn register(&self, session_id: Uuid, due_at: DateTime<Utc>) -> bool {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|d| d.session_id == session_id) {
            return false;
        }
        entries.push(Deadline { session_id, due_at });
        true
    }

    /// Removes and returns every deadline that is due at `now`.
    pub async fn due(&self, now: DateTime<Utc>) -> Vec<Deadline> {
        let mut entries = self.entries.write().await;
        let (due, pending): (Vec<_>, Vec<_>) =
            entries.drain(..).partition(|d| d.due_at <= now);
        *entries = pending;
        due
    }

    pub async fn remove(&self, session_id: Uuid) {
        self.entries
            .write()
            .await
            .retain(|d| d.session_id != session_id);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// What one evaluation sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub backfilled: u64,
    pub dispatched: u64,
    pub requeued: u64,
    pub failed: u64,
    pub timed_out: u64,
}

pub struct SessionScheduler {
    sessions: Arc<dyn SessionRepository>,
    jobs: Arc<dyn EvaluationJobRepository>,
    dispatcher: Arc<dyn EvaluationDispatcher>,
    session_service: Arc<SessionService>,
    deadlines: Arc<DeadlineTable>,
    config: SchedulerConfig,
    last_sweep: RwLock<DateTime<Utc>>,
}

impl SessionScheduler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        jobs: Arc<dyn EvaluationJobRepository>,
        dispatcher: Arc<dyn EvaluationDispatcher>,
        session_service: Arc<SessionService>,
        deadlines: Arc<DeadlineTable>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            sessions,
            jobs,
            dispatcher,
            session_service,
            deadlines,
            config,
            // force a sweep on the first tick after startup
            last_sweep: RwLock::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Registers a forced-completion deadline. Returns false when the
    /// session already has one armed.
    pub async fn schedule_deadline(&self, session_id: Uuid, due_at: DateTime<Utc>) -> bool {
        self.deadlines.register(session_id, due_at).await
    }

    /// Rebuilds the deadline table from storage after a restart.
    ///
    /// Every InProgress session with a start time gets its deadline
    /// re-registered; already-overdue sessions are picked up by the next
    /// tick rather than force-ended inline.
    #[instrument(skip(self), err)]
    pub async fn recover(&self) -> DomainResult<usize> {
        let in_progress = self
            .sessions
            .list_by_status(SessionStatus::InProgress)
            .await?;

        let mut registered = 0;
        for session in &in_progress {
            if let Some(due_at) = session.deadline() {
                if self.deadlines.register(session.id, due_at).await {
                    registered += 1;
                }
            }
        }
        info!(registered, "deadline recovery complete");
        Ok(registered)
    }

    /// Spawns the background tick loop.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }

    /// One scheduler tick: fire due deadlines, then sweep evaluations when
    /// the sweep interval has elapsed. Public so tests can drive time
    /// explicitly instead of racing the background loop.
    pub async fn tick(&self) {
        let now = Utc::now();
        self.fire_due_deadlines(now).await;

        let sweep_due = {
            let last = *self.last_sweep.read().await;
            now - last >= ChronoDuration::seconds(self.config.sweep_interval_secs as i64)
        };
        if sweep_due {
            *self.last_sweep.write().await = now;
            match self.sweep_pending_evaluations().await {
                Ok(outcome) => {
                    if outcome != SweepOutcome::default() {
                        info!(?outcome, "evaluation sweep complete");
                    }
                }
                Err(e) => error!(error = %e, "evaluation sweep failed"),
            }
        }
    }

    async fn fire_due_deadlines(&self, now: DateTime<Utc>) {
        for deadline in self.deadlines.due(now).await {
            match self
                .session_service
                .force_end_session(deadline.session_id)
                .await
            {
                Ok(_) => {
                    info!(session_id = %deadline.session_id, "deadline reached, session force-ended");
                }
                Err(e) => {
                    // transient failure: keep the deadline armed so the next
                    // tick retries
                    warn!(
                        session_id = %deadline.session_id,
                        error = %e,
                        "forced completion failed, re-registering deadline"
                    );
                    self.deadlines
                        .register(deadline.session_id, deadline.due_at)
                        .await;
                }
            }
        }
    }

    /// One evaluation sweep.
    ///
    /// Order matters: completed sessions whose job insert was lost get a
    /// fresh pending job first so they dispatch in the same pass, stale
    /// InProgress claims are timed out next, then each pending job is either
    /// failed (dispatch budget exhausted), or claimed and dispatched. A
    /// failed dispatch releases the claim with the attempt counted.
    #[instrument(skip(self), err)]
    pub async fn sweep_pending_evaluations(&self) -> DomainResult<SweepOutcome> {
        let mut outcome = SweepOutcome {
            backfilled: self.backfill_missing_jobs().await?,
            ..SweepOutcome::default()
        };

        let cutoff = Utc::now() - ChronoDuration::seconds(self.config.evaluation_timeout_secs as i64);
        outcome.timed_out = self.jobs.mark_timed_out_stale(cutoff).await?;
        if outcome.timed_out > 0 {
            warn!(count = outcome.timed_out, "stale evaluation claims timed out");
        }

        for job in self.jobs.list_pending().await? {
            if job.attempts >= self.config.max_dispatch_attempts {
                self.jobs.mark_failed(job.session_id).await?;
                outcome.failed += 1;
                warn!(
                    session_id = %job.session_id,
                    attempts = job.attempts,
                    "dispatch budget exhausted, evaluation marked failed"
                );
                continue;
            }

            // the claim gate keeps concurrent sweeps off the same job
            if !self.jobs.try_claim(job.session_id).await? {
                continue;
            }

            match self.dispatcher.dispatch(job.session_id).await {
                Ok(()) => {
                    // stays InProgress; the evaluation backend reports the
                    // terminal status
                    outcome.dispatched += 1;
                }
                Err(e) => {
                    warn!(session_id = %job.session_id, error = %e, "evaluation dispatch failed");
                    self.jobs.release(job.session_id).await?;
                    outcome.requeued += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Re-enqueues evaluation jobs for completed sessions that have none.
    ///
    /// Completion writes the session first and the job second, so a storage
    /// failure (or crash) between the two leaves a completed session with no
    /// job row. The sweep heals that here instead of leaving the session
    /// unevaluated forever.
    async fn backfill_missing_jobs(&self) -> DomainResult<u64> {
        let mut backfilled = 0;
        let completed = self
            .sessions
            .list_by_status(SessionStatus::Completed)
            .await?;

        for session in completed {
            if session.evaluation_ready || self.jobs.get(session.id).await?.is_some() {
                continue;
            }
            match self.jobs.create(&EvaluationJob::new(session.id)).await {
                Ok(()) => {
                    warn!(session_id = %session.id, "re-enqueued missing evaluation job");
                    backfilled += 1;
                }
                // a concurrent completion or sweep got there first
                Err(DomainError::EvaluationJobExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(backfilled)
    }
}
