#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use greenroom::adapters::sqlite::{
    SqliteEvaluationJobRepository, SqliteEventRepository, SqliteSessionRepository,
    SqliteStateRepository,
};
use greenroom::adapters::StaticQuestionProvider;
use greenroom::domain::models::{QuestionSpec, QuestionTest, SchedulerConfig};
use greenroom::{
    DeadlineTable, DomainError, DomainResult, EvaluationDispatcher, EvaluationJobRepository,
    EventLog, EventRepository, MinutesLedger, Session, SessionRepository, SessionScheduler,
    SessionService, StateNotifier, StateRepository, StateStore,
};

use super::database::setup_test_db;

/// A question with five ground-truth tests, enough that seeding (first
/// three) is observable.
pub fn sample_question() -> QuestionSpec {
    let mut input_parameters = HashMap::new();
    input_parameters.insert(
        "python".to_string(),
        vec!["nums".to_string(), "target".to_string()],
    );

    let tests = (0..5)
        .map(|i| {
            let mut input = HashMap::new();
            input.insert("nums".to_string(), json!([i, i + 1]));
            input.insert("target".to_string(), json!(i * 2 + 1));
            QuestionTest {
                input,
                output: json!([0, 1]),
            }
        })
        .collect();

    QuestionSpec {
        function_name: "two_sum".to_string(),
        input_parameters,
        tests,
        eval_mode: "exact".to_string(),
    }
}

/// Ledger that records every debit for assertions.
#[derive(Default)]
pub struct RecordingLedger {
    pub debits: Mutex<Vec<(String, u32)>>,
}

#[async_trait]
impl MinutesLedger for RecordingLedger {
    async fn debit(&self, user_id: &str, minutes: u32) -> DomainResult<()> {
        self.debits
            .lock()
            .await
            .push((user_id.to_string(), minutes));
        Ok(())
    }
}

/// Dispatcher that fails the first `fail_times` calls, then succeeds.
/// Records every dispatched session id.
#[derive(Default)]
pub struct StubDispatcher {
    fail_remaining: AtomicUsize,
    pub dispatched: Mutex<Vec<Uuid>>,
}

impl StubDispatcher {
    pub fn failing(times: usize) -> Self {
        Self {
            fail_remaining: AtomicUsize::new(times),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.dispatched.lock().await.len()
    }
}

#[async_trait]
impl EvaluationDispatcher for StubDispatcher {
    async fn dispatch(&self, session_id: Uuid) -> DomainResult<()> {
        self.dispatched.lock().await.push(session_id);
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::DispatchFailed("stubbed failure".to_string()));
        }
        Ok(())
    }
}

/// Fully wired service stack over a fresh in-memory database.
pub struct Harness {
    pub pool: SqlitePool,
    pub sessions: Arc<dyn SessionRepository>,
    pub states: Arc<dyn StateRepository>,
    pub events: Arc<dyn EventRepository>,
    pub jobs: Arc<dyn EvaluationJobRepository>,
    pub questions: Arc<StaticQuestionProvider>,
    pub notifier: Arc<StateNotifier>,
    pub state_store: Arc<StateStore>,
    pub event_log: Arc<EventLog>,
    pub deadlines: Arc<DeadlineTable>,
    pub ledger: Arc<RecordingLedger>,
    pub dispatcher: Arc<StubDispatcher>,
    pub service: Arc<SessionService>,
    pub question_id: Uuid,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_dispatcher(Arc::new(StubDispatcher::default())).await
    }

    pub async fn with_dispatcher(dispatcher: Arc<StubDispatcher>) -> Self {
        let pool = setup_test_db().await;

        let sessions: Arc<dyn SessionRepository> =
            Arc::new(SqliteSessionRepository::new(pool.clone()));
        let states: Arc<dyn StateRepository> = Arc::new(SqliteStateRepository::new(pool.clone()));
        let events: Arc<dyn EventRepository> = Arc::new(SqliteEventRepository::new(pool.clone()));
        let jobs: Arc<dyn EvaluationJobRepository> =
            Arc::new(SqliteEvaluationJobRepository::new(pool.clone()));

        let questions = Arc::new(StaticQuestionProvider::new());
        let question_id = Uuid::new_v4();
        questions.insert(question_id, sample_question()).await;

        let notifier = Arc::new(StateNotifier::default());
        let state_store = Arc::new(StateStore::new(
            Arc::clone(&sessions),
            Arc::clone(&states),
            Arc::clone(&events),
            Arc::clone(&notifier),
        ));
        let event_log = Arc::new(EventLog::new(Arc::clone(&events)));
        let deadlines = Arc::new(DeadlineTable::new());
        let ledger = Arc::new(RecordingLedger::default());

        let service = Arc::new(SessionService::new(
            Arc::clone(&sessions),
            Arc::clone(&state_store),
            Arc::clone(&questions) as Arc<dyn greenroom::QuestionProvider>,
            Arc::clone(&jobs),
            Arc::clone(&ledger) as Arc<dyn MinutesLedger>,
            Arc::clone(&deadlines),
        ));

        Self {
            pool,
            sessions,
            states,
            events,
            jobs,
            questions,
            notifier,
            state_store,
            event_log,
            deadlines,
            ledger,
            dispatcher,
            service,
            question_id,
        }
    }

    /// Scheduler over this harness's stores, with a short tick and sweep
    /// interval suitable for tests.
    pub fn scheduler(&self, config: SchedulerConfig) -> Arc<SessionScheduler> {
        Arc::new(SessionScheduler::new(
            Arc::clone(&self.sessions),
            Arc::clone(&self.jobs),
            Arc::clone(&self.dispatcher) as Arc<dyn EvaluationDispatcher>,
            Arc::clone(&self.service),
            Arc::clone(&self.deadlines),
            config,
        ))
    }

    pub fn fast_scheduler_config() -> SchedulerConfig {
        SchedulerConfig {
            tick_interval_ms: 10,
            sweep_interval_secs: 0,
            max_dispatch_attempts: 3,
            evaluation_timeout_secs: 1800,
        }
    }

    /// Creates a session for `user` against the registered sample question.
    pub async fn create_session(&self, user: &str) -> Session {
        self.service
            .create_session(
                user,
                self.question_id,
                "python",
                vec!["intro".to_string(), "coding".to_string()],
                45,
            )
            .await
            .expect("session creation should succeed")
    }
}
