mod helpers;

use chrono::{Duration, Utc};
use greenroom::domain::models::EvaluationJobStatus;
use greenroom::{DomainError, SessionStatus};
use helpers::fixtures::Harness;

#[tokio::test]
async fn test_create_seeds_state_and_initial_event() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;

    assert_eq!(session.status, SessionStatus::NotStarted);
    assert!(!session.evaluation_ready);

    let state = harness.state_store.state(session.id).await.unwrap();
    assert_eq!(state.editor.language, "python");
    assert_eq!(state.editor.content, "def two_sum(nums, target):\n    pass\n");
    // first three of the question's five tests
    assert_eq!(state.test_cases.len(), 3);

    let events = harness.event_log.list_by_session(session.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload.kind(), "content_changed");
}

#[tokio::test]
async fn test_single_active_session_per_user() {
    let harness = Harness::new().await;
    let first = harness.create_session("alice").await;

    let result = harness
        .service
        .create_session("alice", harness.question_id, "python", vec![], 45)
        .await;
    match result {
        Err(DomainError::ActiveSessionExists {
            user_id,
            session_id,
        }) => {
            assert_eq!(user_id, "alice");
            assert_eq!(session_id, first.id);
        }
        other => panic!("expected ActiveSessionExists, got {other:?}"),
    }

    // a different user is unaffected
    harness.create_session("bob").await;
}

#[tokio::test]
async fn test_interleaved_creates_admit_exactly_one() {
    let harness = Harness::new().await;

    // two creates for the same user racing through the service
    let (a, b) = tokio::join!(
        harness
            .service
            .create_session("alice", harness.question_id, "python", vec![], 45),
        harness
            .service
            .create_session("alice", harness.question_id, "python", vec![], 45),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);

    let winner = outcomes.iter().find_map(|r| r.as_ref().ok()).unwrap();
    match outcomes.iter().find_map(|r| r.as_ref().err()).unwrap() {
        DomainError::ActiveSessionExists {
            user_id,
            session_id,
        } => {
            assert_eq!(user_id, "alice");
            assert_eq!(*session_id, winner.id);
        }
        other => panic!("expected ActiveSessionExists, got {other:?}"),
    }

    // the winner's state record was seeded normally
    harness.state_store.state(winner.id).await.unwrap();
}

#[tokio::test]
async fn test_completed_session_frees_the_slot() {
    let harness = Harness::new().await;
    let first = harness.create_session("alice").await;
    harness.service.start_session(first.id).await.unwrap();
    harness.service.end_session(first.id).await.unwrap();

    harness.create_session("alice").await;
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;

    let started = harness.service.start_session(session.id).await.unwrap();
    assert_eq!(started.status, SessionStatus::InProgress);
    let first_start = started.started_at.unwrap();

    let again = harness.service.start_session(session.id).await.unwrap();
    assert_eq!(again.started_at.unwrap(), first_start);

    // only one deadline armed
    assert_eq!(harness.deadlines.len().await, 1);
}

#[tokio::test]
async fn test_start_after_completion_fails() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    harness.service.start_session(session.id).await.unwrap();
    harness.service.end_session(session.id).await.unwrap();

    let result = harness.service.start_session(session.id).await;
    assert!(matches!(result, Err(DomainError::AlreadyCompleted(_))));
}

#[tokio::test]
async fn test_end_session_round_trip_with_billing() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let mut started = harness.service.start_session(session.id).await.unwrap();

    // pretend the session has been running for 5.5 minutes
    started.started_at = Some(Utc::now() - Duration::seconds(330));
    harness.sessions.update(&started).await.unwrap();

    let ended = harness.service.end_session(session.id).await.unwrap();
    assert_eq!(ended.status, SessionStatus::Completed);
    assert!(ended.ended_at.is_some());

    // partial minutes are not billed
    let debits = harness.ledger.debits.lock().await;
    assert_eq!(debits.as_slice(), &[("alice".to_string(), 5)]);

    let job = harness.jobs.get(session.id).await.unwrap().unwrap();
    assert_eq!(job.status, EvaluationJobStatus::Pending);
    assert_eq!(job.attempts, 0);
}

#[tokio::test]
async fn test_end_under_a_minute_bills_nothing() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    harness.service.start_session(session.id).await.unwrap();
    harness.service.end_session(session.id).await.unwrap();

    assert!(harness.ledger.debits.lock().await.is_empty());
}

#[tokio::test]
async fn test_end_twice_is_loud_for_user_silent_for_deadline() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    harness.service.start_session(session.id).await.unwrap();
    harness.service.end_session(session.id).await.unwrap();

    let result = harness.service.end_session(session.id).await;
    assert!(matches!(result, Err(DomainError::AlreadyCompleted(_))));

    // the deadline path tolerates a session already ended by the user
    let forced = harness.service.force_end_session(session.id).await.unwrap();
    assert_eq!(forced.status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_force_end_never_bills() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let mut started = harness.service.start_session(session.id).await.unwrap();
    started.started_at = Some(Utc::now() - Duration::minutes(45));
    harness.sessions.update(&started).await.unwrap();

    harness.service.force_end_session(session.id).await.unwrap();

    assert!(harness.ledger.debits.lock().await.is_empty());
    assert!(harness.jobs.get(session.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_end_without_start_completes_without_billing() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;

    let ended = harness.service.end_session(session.id).await.unwrap();
    assert_eq!(ended.status, SessionStatus::Completed);
    assert!(ended.started_at.is_none());
    assert!(harness.ledger.debits.lock().await.is_empty());
}

#[tokio::test]
async fn test_external_result_writer_flow() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    harness.service.start_session(session.id).await.unwrap();
    harness.service.end_session(session.id).await.unwrap();

    // the evaluation backend lands its result through the repositories
    harness.jobs.mark_succeeded(session.id).await.unwrap();
    harness
        .sessions
        .set_evaluation_ready(session.id)
        .await
        .unwrap();

    let job = harness.jobs.get(session.id).await.unwrap().unwrap();
    assert_eq!(job.status, EvaluationJobStatus::Success);
    assert!(job.status.is_terminal());

    let session = harness.service.get_session(session.id).await.unwrap().unwrap();
    assert!(session.evaluation_ready);
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let harness = Harness::new().await;
    let result = harness.service.start_session(uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(DomainError::SessionNotFound(_))));
}
