//! Review surface driver.
//!
//! Owns one [`ReviewSession`] on the surface side: sends the reviewer's
//! decisions to the origin, applies `SuggestionUpdated` broadcasts and
//! periodically refreshes the draft from the stored suggestion.

use std::time::Duration;

use recorder_config::ReviewConfig;
use serde_json::Value;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::{Result, ReviewError};
use crate::message::ReviewMessage;
use crate::session::{ReviewSession, SubmitWait};
use crate::store::SuggestionStore;

pub struct ReviewSurface {
    session: ReviewSession,
    store: SuggestionStore,
    outbound: mpsc::Sender<Value>,
    updates: broadcast::Receiver<ReviewMessage>,
    refresh_interval: Duration,
    submit_timeout: Duration,
}

impl ReviewSurface {
    pub fn new(
        session: ReviewSession,
        store: SuggestionStore,
        outbound: mpsc::Sender<Value>,
        updates: broadcast::Receiver<ReviewMessage>,
        config: &ReviewConfig,
    ) -> Self {
        Self {
            session,
            store,
            outbound,
            updates,
            refresh_interval: config.refresh_interval(),
            submit_timeout: config.submit_timeout(),
        }
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    /// Mutable access for the reviewer's typing.
    pub fn session_mut(&mut self) -> &mut ReviewSession {
        &mut self.session
    }

    async fn send(&self, message: ReviewMessage) -> Result<()> {
        let value = serde_json::to_value(&message)
            .map_err(|e| ReviewError::MalformedMessage(e.to_string()))?;
        self.outbound
            .send(value)
            .await
            .map_err(|_| ReviewError::OriginGone)
    }

    /// Re-read the stored suggestion into fields the reviewer left alone.
    ///
    /// A batch refresh that moved another field onto this index leaves the
    /// draft untouched.
    pub async fn refresh(&mut self) -> Result<bool> {
        let latest = match self.store.get(self.session.identity()).await {
            Ok(latest) => latest,
            Err(e @ (ReviewError::FieldMismatch { .. } | ReviewError::InvalidIndex { .. })) => {
                debug!(error = %e, "Stored suggestion no longer matches this surface");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        self.session.refresh(&latest)
    }

    /// Apply every update already delivered. Returns how many were for this
    /// field.
    pub fn pump_updates(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.updates.try_recv() {
                Ok(message) => {
                    if self.session.apply_update(&message).is_ok() {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Review updates lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    pub async fn cancel(&mut self) -> Result<()> {
        let message = self.session.cancel()?;
        self.send(message).await
    }

    pub async fn confirm(&mut self) -> Result<()> {
        let message = self.session.confirm()?;
        self.send(message).await
    }

    /// Send the draft and wait, at most the configured submit timeout, for
    /// the origin to report how it went.
    pub async fn submit(&mut self) -> Result<SubmitWait> {
        let message = self.session.submit()?;
        self.send(message).await?;
        Ok(self
            .session
            .await_submit(&mut self.updates, self.submit_timeout)
            .await)
    }

    /// Close the surface. Cancels unless the session already ended.
    pub async fn close(mut self) -> Result<ReviewSession> {
        if let Some(message) = self.session.close() {
            self.send(message).await?;
        }
        Ok(self.session)
    }

    /// Keep the draft current while the reviewer is idle: apply updates as
    /// they arrive and refresh on the configured interval. Returns when
    /// `shutdown` fires or the update channel closes.
    pub async fn watch(&mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The session was opened from the store moments ago.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "Review refresh failed");
                    }
                }
                update = self.updates.recv() => match update {
                    Ok(message) => {
                        if let Err(e) = self.session.apply_update(&message) {
                            debug!(error = %e, "Ignoring update for another field");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Review updates lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
