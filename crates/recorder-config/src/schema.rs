//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub review: ReviewConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub recording: RecordingConfig,
}

/// Remote service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Pending-confirmation drain schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between full drain passes.
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,

    /// Pause between two items of one pass, in milliseconds.
    #[serde(default = "default_item_delay")]
    pub item_delay_ms: u64,

    /// Drain once immediately when the daemon starts.
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            item_delay_ms: default_item_delay(),
            run_on_startup: true,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

fn default_sync_interval() -> u64 {
    300
}

fn default_item_delay() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

/// Review surface behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// How long a review surface waits for a submit outcome before it stops
    /// showing the pending state.
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_ms: u64,

    /// How often an open review surface refetches its suggestion.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            submit_timeout_ms: default_submit_timeout(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl ReviewConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn default_submit_timeout() -> u64 {
    3000
}

fn default_refresh_interval() -> u64 {
    5
}

/// Persisted state location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("~/.recorder/state")
}

/// Recorder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Capturing context whose action log the CLI operates on.
    #[serde(default = "default_context")]
    pub context: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            context: default_context(),
        }
    }
}

fn default_context() -> String {
    "default".to_string()
}
