mod helpers;

use greenroom::services::MAX_TEST_CASES;
use greenroom::{DomainError, EditorSync, EventPayload, TestCase, TestCaseDraft};
use helpers::fixtures::Harness;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TEMPLATE: &str = "def two_sum(nums, target):\n    pass\n";

async fn connect_sync(harness: &Harness, session_id: uuid::Uuid) -> EditorSync {
    EditorSync::connect(
        session_id,
        Arc::clone(&harness.state_store),
        Arc::clone(&harness.event_log),
        Duration::from_millis(20),
    )
    .await
    .unwrap()
}

fn custom_case(target: i64) -> TestCase {
    let mut input = HashMap::new();
    input.insert("nums".to_string(), json!([5, 6]));
    input.insert("target".to_string(), json!(target));
    TestCase {
        input,
        expected_output: Some(json!([0, 1])),
    }
}

#[tokio::test]
async fn test_burst_of_edits_commits_once() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    assert!(sync.on_edit("a").await);
    assert!(sync.on_edit("ab").await);
    assert!(sync.on_edit("abc").await);
    sync.flush().await;

    let editor = harness.state_store.editor_state(session.id).await.unwrap();
    assert_eq!(editor.content, "abc");
    assert!(!sync.is_dirty().await);

    // one seed event plus one coalesced content-changed event
    let events = harness.event_log.list_by_session(session.id).await.unwrap();
    assert_eq!(events.len(), 2);
    match &events[1].payload {
        EventPayload::ContentChanged { before, after } => {
            // the event spans the whole burst
            assert_eq!(before, TEMPLATE);
            assert_eq!(after, "abc");
        }
        other => panic!("expected content_changed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_separate_bursts_commit_separately() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    sync.on_edit("first").await;
    sync.flush().await;
    sync.on_edit("second").await;
    sync.flush().await;

    let events = harness.event_log.list_by_session(session.id).await.unwrap();
    assert_eq!(events.len(), 3);
    match &events[2].payload {
        EventPayload::ContentChanged { before, after } => {
            assert_eq!(before, "first");
            assert_eq!(after, "second");
        }
        other => panic!("expected content_changed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_edit_fires_without_flush_after_quiet_period() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    sync.on_edit("settled").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let editor = harness.state_store.editor_state(session.id).await.unwrap();
    assert_eq!(editor.content, "settled");
}

#[tokio::test]
async fn test_echo_push_is_ignored() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    sync.on_edit("mine").await;
    sync.flush().await;

    // our own commit comes back around through the notifier
    sync.on_push("mine").await;
    assert_eq!(sync.local_content().await, "mine");
    assert!(!sync.is_dirty().await);
}

#[tokio::test]
async fn test_foreign_push_adopted_when_clean() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    sync.on_push("from elsewhere").await;
    assert_eq!(sync.local_content().await, "from elsewhere");
}

#[tokio::test]
async fn test_foreign_push_loses_to_pending_local_edit() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    sync.on_edit("local wins").await;
    sync.on_push("from elsewhere").await;
    assert_eq!(sync.local_content().await, "local wins");

    sync.flush().await;
    let editor = harness.state_store.editor_state(session.id).await.unwrap();
    assert_eq!(editor.content, "local wins");
}

#[tokio::test]
async fn test_disconnected_client_is_read_only() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    sync.on_edit("before disconnect").await;
    sync.set_connected(false).await;

    // the pending edit was flushed on disconnect
    let editor = harness.state_store.editor_state(session.id).await.unwrap();
    assert_eq!(editor.content, "before disconnect");

    assert!(!sync.on_edit("after disconnect").await);
    let editor = harness.state_store.editor_state(session.id).await.unwrap();
    assert_eq!(editor.content, "before disconnect");

    sync.set_connected(true).await;
    assert!(sync.on_edit("after reconnect").await);
}

#[tokio::test]
async fn test_unchanged_edit_is_dropped() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let sync = connect_sync(&harness, session.id).await;

    assert!(!sync.on_edit(TEMPLATE).await);
    sync.flush().await;

    let events = harness.event_log.list_by_session(session.id).await.unwrap();
    assert_eq!(events.len(), 1, "no event beyond the seed");
}

#[tokio::test]
async fn test_test_case_cap() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let mut draft = TestCaseDraft::load(
        session.id,
        Arc::clone(&harness.state_store),
        Arc::clone(&harness.event_log),
    )
    .await
    .unwrap();

    // three seeded cases leave room for two more
    assert_eq!(draft.cases().len(), 3);
    draft.add(custom_case(10)).unwrap();
    draft.add(custom_case(11)).unwrap();

    let result = draft.add(custom_case(12));
    assert!(matches!(
        result,
        Err(DomainError::TestCaseLimitExceeded { max: MAX_TEST_CASES })
    ));
    assert_eq!(draft.cases().len(), MAX_TEST_CASES);
}

#[tokio::test]
async fn test_save_commits_only_when_dirty() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let mut draft = TestCaseDraft::load(
        session.id,
        Arc::clone(&harness.state_store),
        Arc::clone(&harness.event_log),
    )
    .await
    .unwrap();

    // untouched draft, nothing to write
    assert!(draft.save().await.unwrap().is_none());

    draft.add(custom_case(10)).unwrap();
    let event = draft.save().await.unwrap().expect("dirty save writes");
    match &event.payload {
        EventPayload::TestcaseChanged { before, after } => {
            assert_eq!(before.len(), 3);
            assert_eq!(after.len(), 4);
        }
        other => panic!("expected testcase_changed, got {other:?}"),
    }

    let stored = harness
        .state_store
        .test_cases_state(session.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 4);

    // saving again without changes is a no-op
    assert!(draft.save().await.unwrap().is_none());
    let events = harness.event_log.list_by_session(session.id).await.unwrap();
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_remove_and_update_draft_cases() {
    let harness = Harness::new().await;
    let session = harness.create_session("alice").await;
    let mut draft = TestCaseDraft::load(
        session.id,
        Arc::clone(&harness.state_store),
        Arc::clone(&harness.event_log),
    )
    .await
    .unwrap();

    draft.remove(0);
    assert_eq!(draft.cases().len(), 2);
    draft.update(0, custom_case(99));
    assert_eq!(draft.cases()[0].input["target"], json!(99));

    draft.save().await.unwrap().expect("dirty save writes");
    let stored = harness
        .state_store
        .test_cases_state(session.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}
