pub mod config;
pub mod evaluation;
pub mod event;
pub mod question;
pub mod session;
pub mod state;

pub use config::{
    Config, DatabaseConfig, DispatcherConfig, LoggingConfig, RetryConfig, SchedulerConfig,
    SessionConfig, SyncConfig,
};
pub use evaluation::{EvaluationJob, EvaluationJobStatus};
pub use event::{EventPayload, SessionEvent, TestCaseResult};
pub use question::{QuestionSpec, QuestionTest, SEED_TEST_CASE_COUNT};
pub use session::{Session, SessionStatus};
pub use state::{
    replay_events, EditorState, SessionState, StageState, TerminalState, TestCase,
};
