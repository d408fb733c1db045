//! Origin-side handling of review messages.
//!
//! The origin page owns the suggestion store and the markers. Review
//! surfaces send it `CancelEdit`, `ConfirmEdit` and `SubmitEdit`; it answers
//! on a broadcast channel with `SuggestionUpdated`, which every open surface
//! filters by field identity.

use std::sync::Arc;

use recorder_core::{EventRecorder, NodeId, Page};
use recorder_protocols::{
    ActionKind, ActionRecord, Backend, FieldIdentity, PendingConfirmation, Suggestion,
    SuggestionEventDetails, TargetInfo, UpdateSuggestionRequest, now_millis,
};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::batch::SuggestOutcome;
use crate::error::{Result, ReviewError};
use crate::marker::{MARKER_CLASS, MarkerBoard, MarkerState};
use crate::message::{ReviewMessage, UpdateOutcome};
use crate::session::ReviewSession;
use crate::store::SuggestionStore;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

pub struct OriginCoordinator {
    store: SuggestionStore,
    markers: MarkerBoard,
    backend: Arc<dyn Backend>,
    recorder: Option<Arc<EventRecorder>>,
    updates: broadcast::Sender<ReviewMessage>,
}

impl OriginCoordinator {
    pub fn new(store: SuggestionStore, backend: Arc<dyn Backend>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            store,
            markers: MarkerBoard::new(),
            backend,
            recorder: None,
            updates,
        }
    }

    /// Record marker clicks and review opens in this recorder's log.
    pub fn with_recorder(mut self, recorder: Arc<EventRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn store(&self) -> &SuggestionStore {
        &self.store
    }

    pub fn markers(&self) -> &MarkerBoard {
        &self.markers
    }

    /// Updates sent to review surfaces.
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewMessage> {
        self.updates.subscribe()
    }

    /// Request suggestions for the page and mark the fields that have one.
    pub async fn load_suggestions(&self, page: &mut Page) -> Result<SuggestOutcome> {
        let html = page.document.to_html();
        let outcome = self.store.fetch(self.backend.as_ref(), &html).await?;
        self.markers.inject(&mut page.document, &outcome.suggestions);
        Ok(outcome)
    }

    /// Re-place markers for the stored batch.
    pub async fn inject_markers(&self, page: &mut Page) -> Result<usize> {
        let batch = self.store.batch().await?;
        Ok(self.markers.inject(&mut page.document, &batch))
    }

    /// Open a review for the marker at `element`.
    pub async fn open_review(
        &self,
        page: &Page,
        element: NodeId,
        x: f64,
        y: f64,
    ) -> Result<ReviewSession> {
        let clicked_at = now_millis();
        let marker = self.markers.at_element(element).ok_or(ReviewError::NoMarker)?;
        let suggestion = self.store.get(&marker.identity).await?;

        let details = SuggestionEventDetails {
            suggestion_index: marker.identity.idx,
            field_name: suggestion.field_label().to_string(),
            field_type: suggestion.field_type.clone(),
            open_delay_ms: None,
        };
        let click = ActionRecord::element(
            ActionKind::SuggestionMarkerClick,
            TargetInfo {
                tag: "BUTTON".to_string(),
                id: format!("suggestion-btn-{}", marker.identity.idx),
                class: MARKER_CLASS.to_string(),
            },
            page.url.clone(),
            clicked_at,
        )
        .with_coordinates(x, y)
        .with_suggestion(details.clone());
        self.record(page, click).await;

        let session = ReviewSession::open(marker.identity.clone(), suggestion);

        let opened_at = now_millis();
        let open = ActionRecord::navigation(
            ActionKind::SuggestionReviewOpen,
            page.url.clone(),
            opened_at,
        )
        .with_suggestion(SuggestionEventDetails {
            open_delay_ms: Some(opened_at - clicked_at),
            ..details
        });
        self.record(page, open).await;

        Ok(session)
    }

    async fn record(&self, page: &Page, record: ActionRecord) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        if let Err(e) = recorder.record_action(page, record).await {
            warn!(error = %e, "Failed to record suggestion interaction");
        }
    }

    /// Handle an untyped message from a review surface.
    pub async fn handle_raw(&self, page_url: &str, message: Value) -> Result<()> {
        let message = ReviewMessage::parse(message)?;
        self.handle(page_url, message).await
    }

    /// Handle one message, including its backend call.
    pub async fn handle(&self, page_url: &str, message: ReviewMessage) -> Result<()> {
        match self.accept(page_url, message).await? {
            Some(delivery) => self.deliver(delivery).await,
            None => Ok(()),
        }
    }

    /// Apply the local effects of a message. Returns the backend call still
    /// owed, if any.
    async fn accept(&self, page_url: &str, message: ReviewMessage) -> Result<Option<Delivery>> {
        debug!(action = message.action(), idx = message.item().idx, "Review message");
        match message {
            ReviewMessage::CancelEdit { item } => {
                self.store.get(&item).await?;
                self.markers.set(item.idx, MarkerState::Cancelled);
                Ok(None)
            }
            ReviewMessage::ConfirmEdit { item } => {
                let suggestion = self.store.get(&item).await?;
                self.markers.set(item.idx, MarkerState::Confirmed);
                Ok(Some(Delivery::Confirm(PendingConfirmation {
                    field: suggestion.field_label().to_string(),
                    timestamp_ms: now_millis(),
                    page_url: page_url.to_string(),
                    suggestion_index: item.idx,
                    payload: suggestion,
                })))
            }
            ReviewMessage::SubmitEdit { item, edit } => {
                let local = self.store.apply_local_edit(&item, &edit).await?;
                self.markers.set(item.idx, MarkerState::Submitted);
                self.publish(&item, local.clone(), UpdateOutcome::Optimistic);
                let request = UpdateSuggestionRequest::new(local.field_label(), &edit);
                Ok(Some(Delivery::Submit {
                    item,
                    request,
                    local,
                }))
            }
            ReviewMessage::SuggestionUpdated { .. } => {
                debug!("Ignoring update echoed back to the origin");
                Ok(None)
            }
        }
    }

    async fn deliver(&self, delivery: Delivery) -> Result<()> {
        match delivery {
            Delivery::Confirm(confirmation) => self.confirm(confirmation).await,
            Delivery::Submit {
                item,
                request,
                local,
            } => self.submit(&item, &request, local).await,
        }
    }

    /// A failed confirmation is queued for the sync daemon instead of being
    /// retried here.
    async fn confirm(&self, confirmation: PendingConfirmation) -> Result<()> {
        match self.backend.confirm_suggestion(&confirmation).await {
            Ok(()) => info!(field = %confirmation.field, "Suggestion confirmed"),
            Err(e) => {
                warn!(field = %confirmation.field, error = %e, "Confirmation failed; queued for sync");
                self.store.enqueue_confirmation(confirmation).await?;
            }
        }
        Ok(())
    }

    /// A failed edit keeps the local values and is not retried.
    async fn submit(
        &self,
        item: &FieldIdentity,
        request: &UpdateSuggestionRequest,
        local: Suggestion,
    ) -> Result<()> {
        match self.backend.update_input_suggestion(request).await {
            Ok(response) => {
                let confirmed = self.store.apply_server_update(item, &response).await?;
                info!(field = %request.field, "Suggestion edit accepted");
                self.publish(item, confirmed, UpdateOutcome::ServerConfirmed);
            }
            Err(e) => {
                warn!(field = %request.field, error = %e, "Suggestion edit failed");
                self.markers.set(item.idx, MarkerState::Failed);
                self.publish(item, local, UpdateOutcome::Failed);
            }
        }
        Ok(())
    }

    fn publish(&self, item: &FieldIdentity, suggestion: Suggestion, outcome: UpdateOutcome) {
        let message = ReviewMessage::SuggestionUpdated {
            item: item.clone(),
            suggestion,
            outcome,
        };
        // No open surface is not an error.
        self.updates.send(message).ok();
    }

    /// Handle inbound messages until shutdown or until every sender is gone.
    ///
    /// Local effects are applied in arrival order. Backend calls run as
    /// separate tasks so one slow field never holds up another. When the
    /// senders are gone the loop waits for calls still in flight; on shutdown
    /// they are left to finish on their own.
    pub async fn run(
        self: Arc<Self>,
        page_url: String,
        mut inbound: mpsc::Receiver<Value>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        info!(url = %page_url, "Review coordinator started");
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(in_flight = in_flight.len(), "Review coordinator shutting down");
                    in_flight.detach_all();
                    return;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Backend call task failed");
                    }
                }
                message = inbound.recv() => {
                    let Some(message) = message else {
                        debug!("All review surfaces closed");
                        break;
                    };
                    let accepted = match ReviewMessage::parse(message) {
                        Ok(message) => self.accept(&page_url, message).await,
                        Err(e) => Err(e),
                    };
                    match accepted {
                        Ok(Some(delivery)) => {
                            let this = self.clone();
                            in_flight.spawn(async move {
                                if let Err(e) = this.deliver(delivery).await {
                                    warn!(error = %e, "Backend follow-up failed");
                                }
                            });
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "Rejected review message"),
                    }
                }
            }
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Backend call task failed");
            }
        }
    }
}

/// Backend call owed after a message's local effects were applied.
enum Delivery {
    Confirm(PendingConfirmation),
    Submit {
        item: FieldIdentity,
        request: UpdateSuggestionRequest,
        local: Suggestion,
    },
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
