//! Shared wiring for subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use recorder_config::{Config, ConfigLoader, ConfigValidator};
use recorder_core::{EventRecorder, FileStateStore, HttpBackend, PersistedState};

/// Get the ~/.recorder directory path.
pub(crate) fn recorder_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".recorder"))
        .unwrap_or_else(|| PathBuf::from(".recorder"))
}

/// Configuration, persisted state and backend for one invocation.
pub(crate) struct AppContext {
    pub config: Config,
    pub state: Arc<PersistedState>,
    pub backend: Arc<HttpBackend>,
}

impl AppContext {
    pub async fn open(config_path: &Path, state_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = ConfigLoader::load_or_default(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        if let Some(dir) = state_dir {
            config.storage.state_dir = ConfigLoader::expand_path(&dir);
        }

        let validation = ConfigValidator::validate(&config);
        for warning in &validation.warnings {
            warn!("Config warning at {}: {}", warning.path, warning.message);
        }
        if !validation.is_valid() {
            for error in &validation.errors {
                tracing::error!("Config error at {}: {}", error.path, error.message);
            }
            bail!("Invalid configuration ({} errors)", validation.errors.len());
        }

        let store = FileStateStore::new(config.storage.state_dir.clone())
            .await
            .context("Failed to open state directory")?;
        let state = Arc::new(PersistedState::new(Arc::new(store)));
        let backend = Arc::new(
            HttpBackend::new(&config.backend.base_url, config.backend.request_timeout())
                .context("Failed to build HTTP client")?,
        );
        info!(
            backend = %config.backend.base_url,
            state_dir = %config.storage.state_dir.display(),
            "Recorder context ready"
        );

        Ok(Self {
            config,
            state,
            backend,
        })
    }

    /// Recorder for the configured capturing context.
    pub fn recorder(&self) -> EventRecorder {
        EventRecorder::new(self.config.recording.context.clone(), self.state.clone())
    }
}
