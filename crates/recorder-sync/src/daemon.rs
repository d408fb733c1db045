//! Periodic drain of the pending-confirmation queue.

use std::sync::Arc;
use std::time::Duration;

use recorder_config::SyncConfig;
use recorder_core::PersistedState;
use recorder_protocols::{Backend, PendingConfirmation};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::Result;

/// Outcome of one pass over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub delivered: usize,
    /// Queue length after the pass, including items enqueued meanwhile.
    pub remaining: usize,
}

/// Retries queued confirmations against the backend.
pub struct SyncDaemon {
    state: Arc<PersistedState>,
    backend: Arc<dyn Backend>,
    interval: Duration,
    item_delay: Duration,
    run_on_startup: bool,
    /// Held for the duration of a pass; passes never overlap.
    draining: Mutex<()>,
}

impl SyncDaemon {
    pub fn new(state: Arc<PersistedState>, backend: Arc<dyn Backend>, config: &SyncConfig) -> Self {
        Self {
            state,
            backend,
            interval: config.interval(),
            item_delay: config.item_delay(),
            run_on_startup: config.run_on_startup,
            draining: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn item_delay(&self) -> Duration {
        self.item_delay
    }

    /// Attempt every queued confirmation once, in order.
    ///
    /// Each attempt starts only after the previous one finished, with
    /// `item_delay` between attempts. Failed items stay queued; delivered
    /// ones are removed in a single write at the end of the pass.
    pub async fn drain_once(&self) -> Result<DrainReport> {
        let _pass = self.draining.lock().await;

        let queue = self.state.pending_confirmations().await?;
        if queue.is_empty() {
            debug!("No pending confirmations");
            return Ok(DrainReport::default());
        }
        info!(count = queue.len(), "Draining pending confirmations");

        let mut delivered: Vec<PendingConfirmation> = Vec::new();
        for (i, item) in queue.iter().enumerate() {
            if i > 0 && !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }
            match self.backend.confirm_suggestion(item).await {
                Ok(()) => {
                    debug!(field = %item.field, idx = item.suggestion_index, "Confirmation delivered");
                    delivered.push(item.clone());
                }
                Err(e) => {
                    warn!(field = %item.field, error = %e, "Confirmation still failing");
                }
            }
        }

        let remaining = if delivered.is_empty() {
            self.state.pending_confirmations().await?.len()
        } else {
            self.state.remove_delivered(&delivered).await?
        };

        let report = DrainReport {
            attempted: queue.len(),
            delivered: delivered.len(),
            remaining,
        };
        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            remaining = report.remaining,
            "Drain pass finished"
        );
        Ok(report)
    }

    /// Drain on a fixed interval until shutdown.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        let start = if self.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            run_on_startup = self.run_on_startup,
            "Sync daemon started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Sync daemon shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain_once().await {
                        error!(error = %e, "Drain pass failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
