//! Typed access to the persisted namespace.

use std::sync::Arc;

use recorder_protocols::{
    ActionRecord, PendingConfirmation, StateKey, StateStore, StoreError, Suggestion,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use super::MemoryStateStore;

/// Typed view over a [`StateStore`].
///
/// Every read-modify-write goes through one async mutex, so components that
/// share an `Arc<PersistedState>` never lose each other's updates. Writers
/// that bypass this handle are not covered.
pub struct PersistedState {
    store: Arc<dyn StateStore>,
    write_lock: Mutex<()>,
}

impl PersistedState {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// State backed by a fresh [`MemoryStateStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStateStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    async fn read<T: DeserializeOwned + Default>(&self, key: &StateKey) -> Result<T, StoreError> {
        match self.store.get(&key.as_key()).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(T::default()),
        }
    }

    async fn write<T: Serialize>(&self, key: &StateKey, value: &T) -> Result<(), StoreError> {
        self.store.set(&key.as_key(), serde_json::to_value(value)?).await
    }

    /// Read, modify and write back one key while holding the write lock.
    async fn update<T, R, F>(&self, key: &StateKey, f: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.write_lock.lock().await;
        let mut value: T = self.read(key).await?;
        let out = f(&mut value);
        self.write(key, &value).await?;
        Ok(out)
    }

    pub async fn is_recording(&self) -> Result<bool, StoreError> {
        self.read(&StateKey::RecordingEnabled).await
    }

    pub async fn set_recording(&self, enabled: bool) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(&StateKey::RecordingEnabled, &enabled).await
    }

    pub async fn action_log(&self, context: &str) -> Result<Vec<ActionRecord>, StoreError> {
        self.read(&StateKey::ActionLog(context.to_string())).await
    }

    /// Append one record; returns the new log length.
    pub async fn append_action(
        &self,
        context: &str,
        record: ActionRecord,
    ) -> Result<usize, StoreError> {
        self.update(&StateKey::ActionLog(context.to_string()), |log: &mut Vec<ActionRecord>| {
            log.push(record);
            log.len()
        })
        .await
    }

    pub async fn clear_action_log(&self, context: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store
            .remove(&StateKey::ActionLog(context.to_string()).as_key())
            .await
    }

    pub async fn current_suggestions(&self) -> Result<Vec<Suggestion>, StoreError> {
        self.read(&StateKey::CurrentSuggestions).await
    }

    pub async fn set_current_suggestions(&self, batch: &[Suggestion]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(&StateKey::CurrentSuggestions, &batch).await
    }

    /// Modify the persisted suggestion batch in place.
    pub async fn update_suggestions<R>(
        &self,
        f: impl FnOnce(&mut Vec<Suggestion>) -> R,
    ) -> Result<R, StoreError> {
        self.update(&StateKey::CurrentSuggestions, f).await
    }

    pub async fn pending_confirmations(&self) -> Result<Vec<PendingConfirmation>, StoreError> {
        self.read(&StateKey::PendingConfirmations).await
    }

    /// Enqueue a confirmation for later delivery; returns the queue length.
    pub async fn push_pending_confirmation(
        &self,
        confirmation: PendingConfirmation,
    ) -> Result<usize, StoreError> {
        self.update(
            &StateKey::PendingConfirmations,
            |queue: &mut Vec<PendingConfirmation>| {
                queue.push(confirmation);
                queue.len()
            },
        )
        .await
    }

    /// Drop delivered confirmations from the queue in one write.
    ///
    /// Each delivered item removes one matching entry, so entries enqueued
    /// while a drain was in flight survive. Returns the remaining length.
    pub async fn remove_delivered(
        &self,
        delivered: &[PendingConfirmation],
    ) -> Result<usize, StoreError> {
        self.update(
            &StateKey::PendingConfirmations,
            |queue: &mut Vec<PendingConfirmation>| {
                for item in delivered {
                    if let Some(pos) = queue.iter().position(|q| q == item) {
                        queue.remove(pos);
                    }
                }
                queue.len()
            },
        )
        .await
    }

    /// Replace the whole queue.
    pub async fn replace_pending_confirmations(
        &self,
        queue: &[PendingConfirmation],
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(&StateKey::PendingConfirmations, &queue).await
    }

    pub async fn server_error(&self) -> Result<bool, StoreError> {
        self.read(&StateKey::ServerError).await
    }

    pub async fn set_server_error(&self, failed: bool) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(&StateKey::ServerError, &failed).await
    }

    /// Remove every persisted key.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let keys = self.store.keys().await?;
        for key in &keys {
            self.store.remove(key).await?;
        }
        debug!("Cleared {} state keys", keys.len());
        Ok(())
    }
}
