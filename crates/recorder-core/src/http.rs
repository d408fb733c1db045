//! HTTP client for the suggestion and recording service.

use std::time::Duration;

use async_trait::async_trait;
use recorder_protocols::{
    ActionRecord, Backend, BackendError, PageSnapshot, PendingConfirmation,
    UpdateSuggestionRequest, UpdateSuggestionResponse,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// [`Backend`] over JSON/HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// `base_url` is like `http://localhost:5000`; a trailing slash is
    /// ignored.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout.as_millis() as u64)
        } else {
            BackendError::Http(e.to_string())
        }
    }

    /// POST a JSON body and return the successful response.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "POST");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[derive(Serialize)]
struct SuggestInputsRequest<'a> {
    html: &'a str,
}

#[derive(Serialize)]
struct EventsRequest<'a> {
    events: &'a [ActionRecord],
}

#[async_trait]
impl Backend for HttpBackend {
    async fn suggest_inputs(&self, html: &str) -> Result<Value, BackendError> {
        let resp = self
            .post("suggest_inputs", &SuggestInputsRequest { html })
            .await?;
        let text = resp.text().await.map_err(|e| self.map_error(e))?;
        // A body that is not JSON at all is handed on as a string and
        // recovered as an empty batch by the caller.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn update_input_suggestion(
        &self,
        request: &UpdateSuggestionRequest,
    ) -> Result<UpdateSuggestionResponse, BackendError> {
        let resp = self.post("update_input_suggestion", request).await?;
        let response: UpdateSuggestionResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        info!(field = %request.field, "Suggestion update accepted");
        Ok(response)
    }

    async fn confirm_suggestion(
        &self,
        confirmation: &PendingConfirmation,
    ) -> Result<(), BackendError> {
        self.post("confirm_suggestion", confirmation).await?;
        debug!(field = %confirmation.field, "Suggestion confirmed");
        Ok(())
    }

    async fn post_events(&self, events: &[ActionRecord]) -> Result<(), BackendError> {
        self.post("events", &EventsRequest { events }).await?;
        info!(count = events.len(), "Events delivered");
        Ok(())
    }

    async fn post_snapshot(&self, snapshot: &PageSnapshot) -> Result<(), BackendError> {
        self.post("snapshot", snapshot).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
