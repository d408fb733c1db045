//! Suggestion store.
//!
//! Holds the current suggestion batch in persisted state and applies the
//! two phases of an edit: the reviewer's values first (`Local`), then only
//! the fields the service returned (`ServerConfirmed`).

use std::sync::Arc;
use std::time::Instant;

use recorder_core::PersistedState;
use recorder_protocols::{
    Backend, FieldIdentity, PendingConfirmation, Suggestion, SuggestionEdit, SuggestionOrigin,
    UpdateSuggestionResponse,
};
use tracing::{debug, info};

use crate::batch::{SuggestOutcome, parse_batch};
use crate::error::{Result, ReviewError};

#[derive(Clone)]
pub struct SuggestionStore {
    state: Arc<PersistedState>,
}

impl SuggestionStore {
    pub fn new(state: Arc<PersistedState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<PersistedState> {
        &self.state
    }

    /// Request a batch for `html`, store it and return it with timings.
    ///
    /// Transport failures are returned; malformed payloads become an empty
    /// batch.
    pub async fn fetch(&self, backend: &dyn Backend, html: &str) -> Result<SuggestOutcome> {
        let started = Instant::now();
        let reply = backend.suggest_inputs(html).await?;
        let server_duration_ms = started.elapsed().as_millis() as u64;

        let suggestions = parse_batch(reply);
        self.replace_batch(&suggestions).await?;
        let total_request_duration_ms = started.elapsed().as_millis() as u64;

        info!(
            count = suggestions.len(),
            server_duration_ms, total_request_duration_ms, "Suggestion batch stored"
        );
        Ok(SuggestOutcome {
            suggestions,
            server_duration_ms,
            total_request_duration_ms,
        })
    }

    pub async fn replace_batch(&self, batch: &[Suggestion]) -> Result<()> {
        self.state.set_current_suggestions(batch).await?;
        Ok(())
    }

    pub async fn batch(&self) -> Result<Vec<Suggestion>> {
        Ok(self.state.current_suggestions().await?)
    }

    /// Suggestion at `idx` without an identity check.
    pub async fn get_at(&self, idx: usize) -> Result<Suggestion> {
        let batch = self.batch().await?;
        let len = batch.len();
        batch
            .into_iter()
            .nth(idx)
            .ok_or(ReviewError::InvalidIndex { idx, len })
    }

    /// Suggestion at `identity.idx`, provided it is still the same field.
    pub async fn get(&self, identity: &FieldIdentity) -> Result<Suggestion> {
        let mut batch = self.batch().await?;
        checked(&mut batch, identity).map(|s| s.clone())
    }

    /// Phase one: write the reviewer's values.
    pub async fn apply_local_edit(
        &self,
        identity: &FieldIdentity,
        edit: &SuggestionEdit,
    ) -> Result<Suggestion> {
        let updated = self
            .state
            .update_suggestions(|batch| {
                let suggestion = checked(batch, identity)?;
                suggestion.description = edit.description.clone();
                suggestion.good_examples = edit.examples.clone();
                suggestion.bad_examples = edit.bad_examples.clone();
                suggestion.origin = SuggestionOrigin::Local;
                Ok::<_, ReviewError>(suggestion.clone())
            })
            .await??;
        debug!(idx = identity.idx, field = %identity.field_label(), "Applied local edit");
        Ok(updated)
    }

    /// Phase two: overwrite only what the service returned.
    pub async fn apply_server_update(
        &self,
        identity: &FieldIdentity,
        response: &UpdateSuggestionResponse,
    ) -> Result<Suggestion> {
        let updated = self
            .state
            .update_suggestions(|batch| {
                let suggestion = checked(batch, identity)?;
                if let Some(range) = &response.range {
                    suggestion.description = range.clone();
                }
                if let Some(examples) = &response.new_examples {
                    suggestion.good_examples = examples.clone();
                }
                if let Some(bad_examples) = &response.new_bad_examples {
                    suggestion.bad_examples = bad_examples.clone();
                }
                // A reply that overwrote nothing leaves local values labelled local.
                if !response.is_empty() {
                    suggestion.origin = SuggestionOrigin::ServerConfirmed;
                }
                Ok::<_, ReviewError>(suggestion.clone())
            })
            .await??;
        debug!(idx = identity.idx, field = %identity.field_label(), "Applied server update");
        Ok(updated)
    }

    pub async fn enqueue_confirmation(&self, confirmation: PendingConfirmation) -> Result<usize> {
        Ok(self.state.push_pending_confirmation(confirmation).await?)
    }

    pub async fn pending_confirmations(&self) -> Result<Vec<PendingConfirmation>> {
        Ok(self.state.pending_confirmations().await?)
    }
}

fn checked<'a>(batch: &'a mut [Suggestion], identity: &FieldIdentity) -> Result<&'a mut Suggestion> {
    let len = batch.len();
    let suggestion = batch
        .get_mut(identity.idx)
        .ok_or(ReviewError::InvalidIndex { idx: identity.idx, len })?;
    if !identity.matches(suggestion) {
        return Err(ReviewError::FieldMismatch {
            idx: identity.idx,
            expected: identity.field_label().to_string(),
            found: suggestion.field_label().to_string(),
        });
    }
    Ok(suggestion)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
