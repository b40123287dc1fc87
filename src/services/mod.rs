//! Application services.

pub mod debounce;
pub mod editor_sync;
pub mod event_log;
pub mod scheduler;
pub mod session_service;
pub mod state_notifier;
pub mod state_store;
pub mod testcase_draft;

pub use debounce::Debouncer;
pub use editor_sync::EditorSync;
pub use event_log::EventLog;
pub use scheduler::{Deadline, DeadlineTable, SessionScheduler, SweepOutcome};
pub use session_service::SessionService;
pub use state_notifier::{StateNotifier, StateUpdate};
pub use state_store::StateStore;
pub use testcase_draft::{TestCaseDraft, MAX_TEST_CASES};
