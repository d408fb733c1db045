use std::sync::Arc;

use recorder_core::PersistedState;
use recorder_protocols::{FieldIdentity, Suggestion, UpdateSuggestionResponse};

use super::*;
use crate::coordinator::OriginCoordinator;
use crate::session::SessionState;
use crate::test_support::{ScriptedBackend, unavailable};

const URL: &str = "https://example.com/signup";

fn email() -> Suggestion {
    Suggestion::new("email", "email")
        .with_description("an email")
        .with_examples(vec!["a@b.com".to_string()])
}

fn zip() -> Suggestion {
    Suggestion::new("zip", "zip").with_description("five digits")
}

async fn store_with_batch() -> SuggestionStore {
    let store = SuggestionStore::new(Arc::new(PersistedState::in_memory()));
    store.replace_batch(&[email(), zip()]).await.unwrap();
    store
}

/// Surface wired to a running coordinator.
struct Wired {
    backend: Arc<ScriptedBackend>,
    coordinator: Arc<OriginCoordinator>,
    surface: ReviewSurface,
    _shutdown: broadcast::Sender<()>,
}

async fn wired() -> Wired {
    let backend = Arc::new(ScriptedBackend::new());
    let store = store_with_batch().await;
    let coordinator = Arc::new(OriginCoordinator::new(store.clone(), backend.clone()));
    let (tx, rx) = mpsc::channel(8);
    let (shutdown, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(coordinator.clone().run(URL.to_string(), rx, shutdown_rx));

    let session = ReviewSession::open(FieldIdentity::of(0, &email()), email());
    let surface = ReviewSurface::new(
        session,
        store,
        tx,
        coordinator.subscribe(),
        &ReviewConfig::default(),
    );
    Wired {
        backend,
        coordinator,
        surface,
        _shutdown: shutdown,
    }
}

/// Surface whose outbound messages land in the returned receiver.
async fn detached() -> (
    ReviewSurface,
    SuggestionStore,
    mpsc::Receiver<Value>,
    broadcast::Sender<ReviewMessage>,
) {
    let store = store_with_batch().await;
    let (tx, rx) = mpsc::channel(8);
    let (updates_tx, updates_rx) = broadcast::channel(16);
    let session = ReviewSession::open(FieldIdentity::of(0, &email()), email());
    let surface = ReviewSurface::new(
        session,
        store.clone(),
        tx,
        updates_rx,
        &ReviewConfig::default(),
    );
    (surface, store, rx, updates_tx)
}

#[tokio::test]
async fn test_submit_waits_for_server_values() {
    let mut w = wired().await;
    w.backend.reply_update(Ok(UpdateSuggestionResponse {
        new_examples: Some(vec!["a@b.com".to_string(), "c@d.com".to_string()]),
        ..Default::default()
    }));

    w.surface.session_mut().edit_description("a valid email").unwrap();
    let outcome = w.surface.submit().await.unwrap();

    let SubmitWait::Confirmed(suggestion) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert_eq!(suggestion.description, "a valid email");
    assert_eq!(suggestion.good_examples, vec!["a@b.com", "c@d.com"]);
    assert_eq!(w.surface.session().state(), SessionState::Submitted);
    assert!(!w.surface.session().is_awaiting_submit());
    assert_eq!(w.backend.update_count(), 1);
}

#[tokio::test]
async fn test_submit_failure_keeps_local_edit() {
    let mut w = wired().await;
    w.backend.reply_update(Err(unavailable()));

    w.surface.session_mut().edit_description("a valid email").unwrap();
    assert_eq!(w.surface.submit().await.unwrap(), SubmitWait::Failed);

    let stored = w.coordinator.store().get_at(0).await.unwrap();
    assert_eq!(stored.description, "a valid email");
    assert_eq!(w.surface.session().state(), SessionState::Failed);
}

#[tokio::test]
async fn test_confirm_then_close_sends_nothing_more() {
    let (mut surface, _store, mut rx, _updates) = detached().await;

    surface.confirm().await.unwrap();
    let session = surface.close().await.unwrap();

    assert_eq!(session.state(), SessionState::Confirmed);
    let sent = rx.recv().await.unwrap();
    assert_eq!(sent["action"], "confirmEdit");
    assert_eq!(sent["itemInfo"]["idx"], 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_close_open_surface_cancels() {
    let (surface, _store, mut rx, _updates) = detached().await;

    let session = surface.close().await.unwrap();

    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(rx.recv().await.unwrap()["action"], "cancelEdit");
}

#[tokio::test]
async fn test_send_after_origin_gone() {
    let (mut surface, _store, rx, _updates) = detached().await;
    drop(rx);
    assert!(matches!(surface.cancel().await, Err(ReviewError::OriginGone)));
}

#[tokio::test]
async fn test_refresh_keeps_edited_fields() {
    let (mut surface, store, _rx, _updates) = detached().await;
    surface.session_mut().edit_description("typed by reviewer").unwrap();

    store
        .apply_server_update(
            &FieldIdentity::of(0, &email()),
            &UpdateSuggestionResponse {
                range: Some("from another surface".to_string()),
                new_examples: Some(vec!["x@y.com".to_string()]),
                new_bad_examples: None,
            },
        )
        .await
        .unwrap();

    assert!(surface.refresh().await.unwrap());
    assert_eq!(surface.session().draft().description, "typed by reviewer");
    assert_eq!(surface.session().draft().examples, vec!["x@y.com"]);
}

#[tokio::test]
async fn test_refresh_ignores_replaced_batch() {
    let (mut surface, store, _rx, _updates) = detached().await;
    store.replace_batch(&[zip()]).await.unwrap();

    assert!(!surface.refresh().await.unwrap());
    assert_eq!(surface.session().draft().description, "an email");
}

#[tokio::test]
async fn test_pump_updates_skips_other_fields() {
    let (mut surface, _store, _rx, updates) = detached().await;
    updates
        .send(ReviewMessage::SuggestionUpdated {
            item: FieldIdentity::of(0, &zip()),
            suggestion: zip(),
            outcome: crate::message::UpdateOutcome::ServerConfirmed,
        })
        .unwrap();
    updates
        .send(ReviewMessage::SuggestionUpdated {
            item: FieldIdentity::of(0, &email()),
            suggestion: email().with_description("canonical"),
            outcome: crate::message::UpdateOutcome::ServerConfirmed,
        })
        .unwrap();

    assert_eq!(surface.pump_updates(), 1);
    assert_eq!(surface.session().draft().description, "canonical");
}

#[tokio::test(start_paused = true)]
async fn test_watch_refreshes_on_interval() {
    let (mut surface, store, _rx, _updates) = detached().await;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let driver = async {
        store
            .state()
            .update_suggestions(|batch| batch[0].good_examples = vec!["later@b.com".to_string()])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        shutdown_tx.send(()).unwrap();
    };
    tokio::join!(surface.watch(shutdown_rx), driver);

    assert_eq!(surface.session().draft().examples, vec!["later@b.com"]);
}
