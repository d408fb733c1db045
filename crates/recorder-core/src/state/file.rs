//! File system state store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use recorder_protocols::{StateStore, StoreError, is_valid_key};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

/// Stores each key as a JSON document:
/// ```text
/// {state_dir}/
/// ├── recording-enabled.json
/// ├── action-log.default.json
/// ├── current-suggestions.json
/// └── pending-confirmations.json
/// ```
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader sees either the old or the new document.
pub struct FileStateStore {
    state_dir: PathBuf,
}

impl FileStateStore {
    pub async fn new(state_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let state_dir = state_dir.into();
        fs::create_dir_all(&state_dir).await.map_err(|e| {
            StoreError::Storage(format!("Failed to create state directory {:?}: {}", state_dir, e))
        })?;
        debug!("FileStateStore initialized at {:?}", state_dir);
        Ok(Self { state_dir })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::Storage(format!("Invalid state key '{}'", key)));
        }
        Ok(self.state_dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.key_path(key)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&value)?;

        fs::write(&tmp, content).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        debug!("Saved state key '{}'", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.state_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!("Skipping non-UTF-8 state file {:?}", entry.path());
                continue;
            };
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
