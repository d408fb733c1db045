//! Review session state machine.
//!
//! One session per open review surface. The session owns the reviewer's
//! draft, emits the message for each reviewer action and applies inbound
//! updates for its own field only.

use std::time::Duration;

use recorder_protocols::{FieldIdentity, Suggestion, SuggestionEdit};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::error::{Result, ReviewError};
use crate::message::{ReviewMessage, UpdateOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Cancelled,
    Confirmed,
    Submitted,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        *self != SessionState::Open
    }
}

/// Fields the reviewer has typed into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditedFields {
    pub description: bool,
    pub examples: bool,
    pub bad_examples: bool,
}

impl EditedFields {
    pub fn any(&self) -> bool {
        self.description || self.examples || self.bad_examples
    }
}

/// Result of waiting for a submitted edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitWait {
    Confirmed(Suggestion),
    Failed,
    /// No answer within the window; the pending state was dropped and the
    /// origin may still finish the call.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    identity: FieldIdentity,
    snapshot: Suggestion,
    draft: SuggestionEdit,
    edited: EditedFields,
    state: SessionState,
    awaiting_submit: bool,
}

impl ReviewSession {
    pub fn open(identity: FieldIdentity, suggestion: Suggestion) -> Self {
        let draft = SuggestionEdit {
            description: suggestion.description.clone(),
            examples: suggestion.good_examples.clone(),
            bad_examples: suggestion.bad_examples.clone(),
        };
        Self {
            identity,
            snapshot: suggestion,
            draft,
            edited: EditedFields::default(),
            state: SessionState::Open,
            awaiting_submit: false,
        }
    }

    pub fn identity(&self) -> &FieldIdentity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The suggestion as last received.
    pub fn snapshot(&self) -> &Suggestion {
        &self.snapshot
    }

    /// Values currently shown in the surface.
    pub fn draft(&self) -> &SuggestionEdit {
        &self.draft
    }

    pub fn edited(&self) -> EditedFields {
        self.edited
    }

    pub fn is_edited(&self) -> bool {
        self.edited.any()
    }

    pub fn is_awaiting_submit(&self) -> bool {
        self.awaiting_submit
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(ReviewError::SessionClosed(self.identity.idx));
        }
        Ok(())
    }

    pub fn edit_description(&mut self, text: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        self.draft.description = text.into();
        self.edited.description = true;
        Ok(())
    }

    /// Replace the good examples from a newline-separated text box.
    pub fn edit_examples(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.draft.examples = SuggestionEdit::parse_lines(text);
        self.edited.examples = true;
        Ok(())
    }

    pub fn edit_bad_examples(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.draft.bad_examples = SuggestionEdit::parse_lines(text);
        self.edited.bad_examples = true;
        Ok(())
    }

    fn finish(&mut self, state: SessionState) -> Result<()> {
        self.ensure_open()?;
        debug!(idx = self.identity.idx, ?state, "Review session finished");
        self.state = state;
        Ok(())
    }

    /// Discard the review. The suggestion is left untouched.
    pub fn cancel(&mut self) -> Result<ReviewMessage> {
        self.finish(SessionState::Cancelled)?;
        Ok(ReviewMessage::CancelEdit {
            item: self.identity.clone(),
        })
    }

    /// Accept the suggestion as stored. Unsaved draft values are not sent.
    pub fn confirm(&mut self) -> Result<ReviewMessage> {
        self.finish(SessionState::Confirmed)?;
        Ok(ReviewMessage::ConfirmEdit {
            item: self.identity.clone(),
        })
    }

    /// Send the draft as an edit and start waiting for the outcome.
    pub fn submit(&mut self) -> Result<ReviewMessage> {
        self.finish(SessionState::Submitted)?;
        self.awaiting_submit = true;
        Ok(ReviewMessage::SubmitEdit {
            item: self.identity.clone(),
            edit: self.draft.clone(),
        })
    }

    /// Closing the surface cancels only if nothing else ended the session.
    pub fn close(&mut self) -> Option<ReviewMessage> {
        if self.state.is_terminal() {
            return None;
        }
        self.cancel().ok()
    }

    /// Apply a `SuggestionUpdated` message addressed to this session.
    ///
    /// Messages for another field are rejected with `FieldMismatch`. Returns
    /// whether anything visible changed.
    pub fn apply_update(&mut self, message: &ReviewMessage) -> Result<bool> {
        let ReviewMessage::SuggestionUpdated {
            item,
            suggestion,
            outcome,
        } = message
        else {
            return Ok(false);
        };
        if !self.identity.same_field(item) || !self.identity.matches(suggestion) {
            return Err(ReviewError::FieldMismatch {
                idx: item.idx,
                expected: self.identity.field_label().to_string(),
                found: suggestion.field_label().to_string(),
            });
        }

        let mut changed = false;
        if self.awaiting_submit {
            match outcome {
                UpdateOutcome::Optimistic => {}
                UpdateOutcome::ServerConfirmed => {
                    self.awaiting_submit = false;
                    changed = true;
                }
                UpdateOutcome::Failed => {
                    self.awaiting_submit = false;
                    self.state = SessionState::Failed;
                    changed = true;
                }
            }
        }
        Ok(self.merge(suggestion) || changed)
    }

    /// Periodic refresh with the stored suggestion.
    pub fn refresh(&mut self, latest: &Suggestion) -> Result<bool> {
        if !self.identity.matches(latest) {
            return Err(ReviewError::FieldMismatch {
                idx: self.identity.idx,
                expected: self.identity.field_label().to_string(),
                found: latest.field_label().to_string(),
            });
        }
        Ok(self.merge(latest))
    }

    /// Take new values into the draft for every field the reviewer has not
    /// typed into.
    fn merge(&mut self, latest: &Suggestion) -> bool {
        let mut changed = false;
        if !self.edited.description && self.draft.description != latest.description {
            self.draft.description = latest.description.clone();
            changed = true;
        }
        if !self.edited.examples && self.draft.examples != latest.good_examples {
            self.draft.examples = latest.good_examples.clone();
            changed = true;
        }
        if !self.edited.bad_examples && self.draft.bad_examples != latest.bad_examples {
            self.draft.bad_examples = latest.bad_examples.clone();
            changed = true;
        }
        self.snapshot = latest.clone();
        changed
    }

    /// Give up waiting for a submit outcome.
    pub fn submit_timed_out(&mut self) {
        if self.awaiting_submit {
            warn!(idx = self.identity.idx, "No answer to submitted edit; releasing");
            self.awaiting_submit = false;
        }
    }

    /// Wait for the origin to report the outcome of a submitted edit.
    ///
    /// Updates for other fields are skipped. After `timeout` the pending
    /// state is released without cancelling anything on the origin side.
    pub async fn await_submit(
        &mut self,
        updates: &mut broadcast::Receiver<ReviewMessage>,
        timeout: Duration,
    ) -> SubmitWait {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.awaiting_submit {
            let message = match tokio::time::timeout_at(deadline, updates.recv()).await {
                Ok(Ok(message)) => message,
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!(skipped, "Review updates lagged");
                    continue;
                }
                Ok(Err(RecvError::Closed)) | Err(_) => break,
            };
            if let Err(e) = self.apply_update(&message) {
                debug!(error = %e, "Ignoring update for another field");
            }
        }

        if self.awaiting_submit {
            self.submit_timed_out();
            return SubmitWait::TimedOut;
        }
        match self.state {
            SessionState::Failed => SubmitWait::Failed,
            _ => SubmitWait::Confirmed(self.snapshot.clone()),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
