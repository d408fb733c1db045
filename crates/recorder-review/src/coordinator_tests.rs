use recorder_core::{Document, PersistedState};
use recorder_protocols::{SuggestionEdit, SuggestionOrigin, UpdateSuggestionResponse};
use serde_json::json;

use super::*;
use crate::session::{SessionState, SubmitWait};
use crate::test_support::{ScriptedBackend, unavailable};

const URL: &str = "https://example.com/signup";

struct Harness {
    backend: Arc<ScriptedBackend>,
    coordinator: OriginCoordinator,
    page: Page,
}

async fn harness() -> Harness {
    let backend = Arc::new(ScriptedBackend::new());
    backend.reply_suggest(Ok(json!([
        {"id": "email", "name": "email", "type": "email", "range": "", "examples": []},
        {"id": "zip", "name": "zip", "range": "five digits", "examples": ["12345"]}
    ])));
    let state = Arc::new(PersistedState::in_memory());
    let coordinator = OriginCoordinator::new(SuggestionStore::new(state), backend.clone());
    let mut page = Page::loaded(
        URL,
        Document::parse_html(
            r#"<html><body><form><input id="email"><input name="zip"></form></body></html>"#,
        ),
    );
    coordinator.load_suggestions(&mut page).await.unwrap();
    Harness {
        backend,
        coordinator,
        page,
    }
}

fn email_item() -> FieldIdentity {
    FieldIdentity::new(0, "email", "email")
}

fn submit_edit() -> SuggestionEdit {
    SuggestionEdit {
        description: "a valid email".to_string(),
        examples: vec!["a@b.com".to_string()],
        bad_examples: Vec::new(),
    }
}

#[tokio::test]
async fn test_load_places_markers() {
    let h = harness().await;
    assert_eq!(h.coordinator.markers().markers().len(), 2);
    assert_eq!(h.coordinator.markers().state(1), Some(MarkerState::Default));
}

#[tokio::test]
async fn test_cancel_only_marks() {
    let h = harness().await;
    h.coordinator
        .handle(URL, ReviewMessage::CancelEdit { item: email_item() })
        .await
        .unwrap();

    assert_eq!(h.coordinator.markers().state(0), Some(MarkerState::Cancelled));
    assert_eq!(h.backend.update_count(), 0);
    assert_eq!(h.backend.confirm_count(), 0);
    assert_eq!(h.coordinator.store().get_at(0).await.unwrap().description, "");
}

#[tokio::test]
async fn test_confirm_sends_stored_suggestion() {
    let h = harness().await;
    h.coordinator
        .handle(URL, ReviewMessage::ConfirmEdit { item: email_item() })
        .await
        .unwrap();

    assert_eq!(h.coordinator.markers().state(0), Some(MarkerState::Confirmed));
    assert_eq!(h.backend.update_count(), 0);
    let sent = h.backend.confirm_calls.lock()[0].clone();
    assert_eq!(sent.field, "email");
    assert_eq!(sent.page_url, URL);
    assert_eq!(sent.suggestion_index, 0);
    assert!(h.coordinator.store().pending_confirmations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_confirm_is_queued() {
    let h = harness().await;
    h.backend.reply_confirm(Err(unavailable()));
    h.coordinator
        .handle(URL, ReviewMessage::ConfirmEdit { item: email_item() })
        .await
        .unwrap();

    let queue = h.coordinator.store().pending_confirmations().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].payload.field_id, "email");
    assert_eq!(h.coordinator.markers().state(0), Some(MarkerState::Confirmed));
}

#[tokio::test]
async fn test_submit_two_phase() {
    let h = harness().await;
    h.backend.reply_update(Ok(UpdateSuggestionResponse {
        new_examples: Some(vec!["a@b.com".to_string(), "c@d.com".to_string()]),
        ..Default::default()
    }));
    let mut updates = h.coordinator.subscribe();

    h.coordinator
        .handle(URL, ReviewMessage::SubmitEdit { item: email_item(), edit: submit_edit() })
        .await
        .unwrap();

    let ReviewMessage::SuggestionUpdated { suggestion, outcome, .. } = updates.recv().await.unwrap()
    else {
        panic!("expected update");
    };
    assert_eq!(outcome, UpdateOutcome::Optimistic);
    assert_eq!(suggestion.origin, SuggestionOrigin::Local);
    assert_eq!(suggestion.good_examples, vec!["a@b.com"]);

    let ReviewMessage::SuggestionUpdated { suggestion, outcome, .. } = updates.recv().await.unwrap()
    else {
        panic!("expected update");
    };
    assert_eq!(outcome, UpdateOutcome::ServerConfirmed);
    assert_eq!(suggestion.description, "a valid email");
    assert_eq!(suggestion.good_examples, vec!["a@b.com", "c@d.com"]);

    let request = h.backend.update_calls.lock()[0].clone();
    assert_eq!(request.field, "email");
    assert_eq!(request.range, "a valid email");
    assert_eq!(h.coordinator.markers().state(0), Some(MarkerState::Submitted));
}

#[tokio::test]
async fn test_failed_submit_keeps_local_edit() {
    let h = harness().await;
    h.backend.reply_update(Err(unavailable()));

    h.coordinator
        .handle(URL, ReviewMessage::SubmitEdit { item: email_item(), edit: submit_edit() })
        .await
        .unwrap();

    let stored = h.coordinator.store().get_at(0).await.unwrap();
    assert_eq!(stored.description, "a valid email");
    assert_eq!(stored.good_examples, vec!["a@b.com"]);
    assert_eq!(stored.origin, SuggestionOrigin::Local);
    assert_eq!(h.coordinator.markers().state(0), Some(MarkerState::Failed));
    assert!(h.coordinator.store().pending_confirmations().await.unwrap().is_empty());
    assert_eq!(h.backend.update_count(), 1);
}

#[tokio::test]
async fn test_stale_identity_is_rejected() {
    let h = harness().await;
    let stale = FieldIdentity::new(0, "phone", "phone");

    let err = h
        .coordinator
        .handle(URL, ReviewMessage::SubmitEdit { item: stale, edit: submit_edit() })
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::FieldMismatch { .. }));
    assert_eq!(h.backend.update_count(), 0);
    assert_eq!(h.coordinator.markers().state(0), Some(MarkerState::Default));
}

#[tokio::test]
async fn test_unknown_raw_action() {
    let h = harness().await;
    let err = h
        .coordinator
        .handle_raw(URL, json!({"action": "resetAll", "itemInfo": {"idx": 0}}))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::UnknownAction(_)));
}

#[tokio::test]
async fn test_open_review_records_interactions() {
    let state = Arc::new(PersistedState::in_memory());
    let recorder = Arc::new(EventRecorder::new("tab-1", state.clone()));
    recorder.start().await.unwrap();

    let backend = Arc::new(ScriptedBackend::new());
    backend.reply_suggest(Ok(json!([{"id": "email", "type": "email", "range": "an email"}])));
    let coordinator = OriginCoordinator::new(SuggestionStore::new(state.clone()), backend)
        .with_recorder(recorder);
    let mut page = Page::loaded(
        URL,
        Document::parse_html(r#"<html><body><input id="email"></body></html>"#),
    );
    coordinator.load_suggestions(&mut page).await.unwrap();

    let button = page.document.get_element_by_id("suggestion-btn-0").unwrap();
    let session = coordinator.open_review(&page, button, 4.0, 8.0).await.unwrap();
    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(session.draft().description, "an email");

    let log = state.action_log("tab-1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, ActionKind::SuggestionMarkerClick);
    assert_eq!(log[0].target.as_ref().unwrap().id, "suggestion-btn-0");
    assert_eq!(log[0].suggestion.as_ref().unwrap().field_type, "email");
    assert_eq!(log[1].kind, ActionKind::SuggestionReviewOpen);
    assert!(log[1].suggestion.as_ref().unwrap().open_delay_ms.unwrap() >= 0);

    let input = page.document.get_element_by_id("email").unwrap();
    assert!(matches!(
        coordinator.open_review(&page, input, 0.0, 0.0).await,
        Err(ReviewError::NoMarker)
    ));
}

#[tokio::test]
async fn test_session_round_trip_through_coordinator() {
    let h = harness().await;
    h.backend.reply_update(Err(unavailable()));
    let mut updates = h.coordinator.subscribe();

    let button = h.page.document.get_element_by_id("suggestion-btn-0").unwrap();
    let mut session = h.coordinator.open_review(&h.page, button, 0.0, 0.0).await.unwrap();
    session.edit_description("a valid email").unwrap();
    let message = session.submit().unwrap();
    h.coordinator.handle(URL, message).await.unwrap();

    let outcome = session
        .await_submit(&mut updates, std::time::Duration::from_secs(3))
        .await;
    assert_eq!(outcome, SubmitWait::Failed);
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test]
async fn test_run_loop_dispatches_until_shutdown() {
    let h = harness().await;
    let coordinator = Arc::new(h.coordinator);
    let (tx, rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(coordinator.clone().run(URL.to_string(), rx, shutdown_rx));
    tx.send(json!({"action": "cancelEdit", "itemInfo": {"idx": 1, "id": "zip"}}))
        .await
        .unwrap();
    tx.send(json!({"action": "bogus"})).await.unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(coordinator.markers().state(1), Some(MarkerState::Cancelled));
    drop(shutdown_tx);
}

fn zip_item() -> FieldIdentity {
    FieldIdentity::new(1, "zip", "zip")
}

fn raw(message: ReviewMessage) -> Value {
    serde_json::to_value(&message).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_stalled_confirm_does_not_block_other_fields() {
    let h = harness().await;
    h.backend.stall_confirms();
    let coordinator = Arc::new(h.coordinator);
    let (tx, rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(coordinator.clone().run(URL.to_string(), rx, shutdown_rx));

    tx.send(raw(ReviewMessage::ConfirmEdit { item: email_item() }))
        .await
        .unwrap();
    tx.send(raw(ReviewMessage::CancelEdit { item: zip_item() }))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    assert_eq!(coordinator.markers().state(0), Some(MarkerState::Confirmed));
    assert_eq!(coordinator.markers().state(1), Some(MarkerState::Cancelled));
    assert_eq!(h.backend.confirm_count(), 1);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stalled_update_keeps_optimistic_write_and_other_fields() {
    let h = harness().await;
    h.backend.stall_updates();
    let coordinator = Arc::new(h.coordinator);
    let mut updates = coordinator.subscribe();
    let (tx, rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(coordinator.clone().run(URL.to_string(), rx, shutdown_rx));

    tx.send(raw(ReviewMessage::SubmitEdit {
        item: email_item(),
        edit: submit_edit(),
    }))
    .await
    .unwrap();
    tx.send(raw(ReviewMessage::CancelEdit { item: zip_item() }))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    let first = updates.try_recv().unwrap();
    assert!(matches!(
        first,
        ReviewMessage::SuggestionUpdated {
            outcome: UpdateOutcome::Optimistic,
            ..
        }
    ));
    assert!(updates.try_recv().is_err());
    let stored = coordinator.store().get_at(0).await.unwrap();
    assert_eq!(stored.origin, SuggestionOrigin::Local);
    assert_eq!(coordinator.markers().state(0), Some(MarkerState::Submitted));
    assert_eq!(coordinator.markers().state(1), Some(MarkerState::Cancelled));

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_run_finishes_calls_in_flight_when_surfaces_close() {
    let h = harness().await;
    h.backend.reply_confirm(Err(unavailable()));
    let coordinator = Arc::new(h.coordinator);
    let (tx, rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(coordinator.clone().run(URL.to_string(), rx, shutdown_rx));

    tx.send(raw(ReviewMessage::ConfirmEdit { item: email_item() }))
        .await
        .unwrap();
    drop(tx);
    handle.await.unwrap();

    let queue = coordinator.store().pending_confirmations().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].field, "email");
}
