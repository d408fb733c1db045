//! Process shutdown signalling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::{Result, SyncError};

/// Fan-out shutdown notification for long-running loops.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(4);
        Self {
            sender,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    pub fn request_shutdown(&self) {
        debug!("Shutdown requested");
        self.requested.store(true, Ordering::SeqCst);
        // No subscribers left is fine.
        let _ = self.sender.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Request shutdown on SIGTERM or SIGINT.
    #[cfg(unix)]
    pub fn listen_os_signals(&self) -> Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        for (kind, name) in [
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::interrupt(), "SIGINT"),
        ] {
            let mut stream = signal(kind).map_err(|e| SyncError::SignalSetup(e.to_string()))?;
            let handler = self.clone();
            tokio::spawn(async move {
                if stream.recv().await.is_some() {
                    info!("Received {}", name);
                    handler.request_shutdown();
                }
            });
        }
        Ok(())
    }

    /// Request shutdown on Ctrl-C.
    #[cfg(not(unix))]
    pub fn listen_os_signals(&self) -> Result<()> {
        let handler = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C");
                    handler.request_shutdown();
                }
                Err(e) => tracing::error!("Ctrl-C handler failed: {}", e),
            }
        });
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
