//! Scripted backend shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use recorder_protocols::{
    ActionRecord, Backend, BackendError, PageSnapshot, PendingConfirmation,
    UpdateSuggestionRequest, UpdateSuggestionResponse,
};
use serde_json::Value;

/// Backend that answers from queued replies and records every call.
#[derive(Default)]
pub struct ScriptedBackend {
    pub suggest_replies: Mutex<VecDeque<Result<Value, BackendError>>>,
    pub update_replies: Mutex<VecDeque<Result<UpdateSuggestionResponse, BackendError>>>,
    pub confirm_replies: Mutex<VecDeque<Result<(), BackendError>>>,
    pub update_calls: Mutex<Vec<UpdateSuggestionRequest>>,
    pub confirm_calls: Mutex<Vec<PendingConfirmation>>,
    /// Calls that never answer.
    pub stall_confirm: AtomicBool,
    pub stall_update: AtomicBool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_suggest(&self, reply: Result<Value, BackendError>) {
        self.suggest_replies.lock().push_back(reply);
    }

    pub fn reply_update(&self, reply: Result<UpdateSuggestionResponse, BackendError>) {
        self.update_replies.lock().push_back(reply);
    }

    pub fn reply_confirm(&self, reply: Result<(), BackendError>) {
        self.confirm_replies.lock().push_back(reply);
    }

    pub fn stall_confirms(&self) {
        self.stall_confirm.store(true, Ordering::SeqCst);
    }

    pub fn stall_updates(&self) {
        self.stall_update.store(true, Ordering::SeqCst);
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.lock().len()
    }

    pub fn confirm_count(&self) -> usize {
        self.confirm_calls.lock().len()
    }
}

pub fn unavailable() -> BackendError {
    BackendError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn suggest_inputs(&self, _html: &str) -> Result<Value, BackendError> {
        self.suggest_replies
            .lock()
            .pop_front()
            .unwrap_or(Ok(Value::Array(Vec::new())))
    }

    async fn update_input_suggestion(
        &self,
        request: &UpdateSuggestionRequest,
    ) -> Result<UpdateSuggestionResponse, BackendError> {
        self.update_calls.lock().push(request.clone());
        if self.stall_update.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.update_replies
            .lock()
            .pop_front()
            .unwrap_or(Ok(UpdateSuggestionResponse::default()))
    }

    async fn confirm_suggestion(
        &self,
        confirmation: &PendingConfirmation,
    ) -> Result<(), BackendError> {
        self.confirm_calls.lock().push(confirmation.clone());
        if self.stall_confirm.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.confirm_replies.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn post_events(&self, _events: &[ActionRecord]) -> Result<(), BackendError> {
        Ok(())
    }

    async fn post_snapshot(&self, _snapshot: &PageSnapshot) -> Result<(), BackendError> {
        Ok(())
    }
}
