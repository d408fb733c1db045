//! Event recorder.
//!
//! Turns DOM events on a [`Page`] into [`ActionRecord`]s appended to the
//! action log of one capturing context. Capture is gated by the persisted
//! `recording-enabled` flag and never blocks on the remote service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use recorder_protocols::{
    ActionKind, ActionRecord, Backend, ExpectedValueSource, PageSnapshot, TargetInfo,
    VerificationCommand, VerificationDetails, now_millis,
};
use tracing::{debug, info, warn};

use crate::dom::{Document, NodeId};
use crate::error::{RecorderError, Result};
use crate::locator::locate;
use crate::page::{DomEvent, Page, ReadyState};
use crate::snapshot::{SnapshotBody, SnapshotGate};
use crate::state::PersistedState;

struct SnapshotSink {
    backend: Arc<dyn Backend>,
    gate: SnapshotGate,
}

pub struct EventRecorder {
    context: String,
    state: Arc<PersistedState>,
    page_load_recorded: AtomicBool,
    snapshots: Option<SnapshotSink>,
}

impl EventRecorder {
    pub fn new(context: impl Into<String>, state: Arc<PersistedState>) -> Self {
        Self {
            context: context.into(),
            state,
            page_load_recorded: AtomicBool::new(false),
            snapshots: None,
        }
    }

    /// Send a page snapshot after each captured action whose markup differs
    /// from the last one sent.
    pub fn with_snapshots(mut self, backend: Arc<dyn Backend>) -> Self {
        self.snapshots = Some(SnapshotSink {
            backend,
            gate: SnapshotGate::new(),
        });
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn state(&self) -> &Arc<PersistedState> {
        &self.state
    }

    pub async fn start(&self) -> Result<()> {
        self.state.set_recording(true).await?;
        info!(context = %self.context, "Recording started");
        Ok(())
    }

    /// Called when the recorder is attached to a freshly loaded page. If the
    /// page already finished loading the `load` event will never fire, so
    /// the page load is recorded here.
    pub async fn attach(&self, page: &Page) -> Option<ActionRecord> {
        self.page_load_recorded.store(false, Ordering::SeqCst);
        if page.ready_state == ReadyState::Complete {
            return self.record(page, &DomEvent::Load).await;
        }
        None
    }

    /// Capture an event, logging instead of returning errors.
    pub async fn record(&self, page: &Page, event: &DomEvent) -> Option<ActionRecord> {
        match self.capture(page, event).await {
            Ok(record) => record,
            Err(e) => {
                warn!(context = %self.context, error = %e, "Failed to record event");
                None
            }
        }
    }

    /// Capture an event. Returns `Ok(None)` when recording is disabled or the
    /// event is a repeated page load.
    pub async fn capture(&self, page: &Page, event: &DomEvent) -> Result<Option<ActionRecord>> {
        if !self.state.is_recording().await? {
            return Ok(None);
        }
        if matches!(event, DomEvent::Load) && self.page_load_recorded.swap(true, Ordering::SeqCst)
        {
            debug!("Page load already recorded");
            return Ok(None);
        }

        let record = build_record(page, event)?;
        self.append(page, record).await.map(Some)
    }

    /// Record an action built outside the DOM event path, such as a
    /// suggestion marker click.
    pub async fn record_action(
        &self,
        page: &Page,
        record: ActionRecord,
    ) -> Result<Option<ActionRecord>> {
        if !self.state.is_recording().await? {
            return Ok(None);
        }
        self.append(page, record).await.map(Some)
    }

    async fn append(&self, page: &Page, record: ActionRecord) -> Result<ActionRecord> {
        let len = self.state.append_action(&self.context, record.clone()).await?;
        debug!(context = %self.context, kind = %record.kind, len, "Recorded action");
        self.send_snapshot(page, &record).await;
        Ok(record)
    }

    async fn send_snapshot(&self, page: &Page, record: &ActionRecord) {
        let Some(sink) = &self.snapshots else {
            return;
        };
        let body = SnapshotBody::capture(&page.document);
        if !sink.gate.admit(&body) {
            return;
        }
        let snapshot = PageSnapshot {
            event_type: record.kind.as_str().to_string(),
            time: record.timestamp_ms,
            url: page.url.clone(),
            html: body.html,
            css: body.css,
            event: Some(record.clone()),
        };
        if let Err(e) = sink.backend.post_snapshot(&snapshot).await {
            warn!(error = %e, "Failed to send page snapshot");
            if let Err(e) = self.state.set_server_error(true).await {
                warn!(error = %e, "Failed to persist server error flag");
            }
        }
    }

    /// Stop recording and send the whole action log.
    ///
    /// The `server-error` flag reflects the outcome. Nothing is retried.
    pub async fn stop_and_flush(&self, backend: &dyn Backend) -> Result<usize> {
        self.state.set_recording(false).await?;
        let log = self.state.action_log(&self.context).await?;
        match backend.post_events(&log).await {
            Ok(()) => {
                self.state.set_server_error(false).await?;
                info!(context = %self.context, count = log.len(), "Action log sent");
                Ok(log.len())
            }
            Err(e) => {
                self.state.set_server_error(true).await?;
                warn!(context = %self.context, error = %e, "Failed to send action log");
                Err(e.into())
            }
        }
    }

    /// Discard the action log of this context.
    pub async fn clear(&self) -> Result<()> {
        self.state.clear_action_log(&self.context).await?;
        Ok(())
    }
}

fn build_record(page: &Page, event: &DomEvent) -> Result<ActionRecord> {
    let doc = &page.document;
    let now = now_millis();
    let record = match *event {
        DomEvent::Click { target, x, y } => {
            element_record(doc, ActionKind::Click, target, &page.url, now)?
                .with_value(doc.value(target).map(str::to_string))
                .with_coordinates(x, y)
        }
        DomEvent::Change { target } => {
            element_record(doc, ActionKind::Change, target, &page.url, now)?
                .with_value(doc.value(target).map(str::to_string))
        }
        DomEvent::Submit { target } => {
            element_record(doc, ActionKind::Submit, target, &page.url, now)?
        }
        DomEvent::PopState => ActionRecord::navigation(ActionKind::Popstate, page.url.clone(), now),
        DomEvent::HashChange => {
            ActionRecord::navigation(ActionKind::Hashchange, page.url.clone(), now)
        }
        DomEvent::Load => ActionRecord::navigation(ActionKind::Pageload, page.url.clone(), now),
        DomEvent::Verification { command, target } => {
            verification_record(doc, command, target, &page.url, now)?
        }
    };
    Ok(record)
}

fn target_info(doc: &Document, target: NodeId) -> Result<TargetInfo> {
    let tag = doc
        .tag_name(target)
        .ok_or(RecorderError::UnknownTarget(target))?;
    Ok(TargetInfo {
        tag: tag.to_ascii_uppercase(),
        id: doc.id(target).unwrap_or_default().to_string(),
        class: doc.class_name(target).to_string(),
    })
}

fn element_record(
    doc: &Document,
    kind: ActionKind,
    target: NodeId,
    url: &str,
    now: i64,
) -> Result<ActionRecord> {
    let info = target_info(doc, target)?;
    // A unique id already identifies the element on replay.
    let locator = (!doc.has_unique_id(target)).then(|| locate(doc, target).to_string());
    Ok(ActionRecord::element(kind, info, url, now).with_locator(locator))
}

fn verification_record(
    doc: &Document,
    command: VerificationCommand,
    target: NodeId,
    url: &str,
    now: i64,
) -> Result<ActionRecord> {
    let info = target_info(doc, target)?;
    let locator = locate(doc, target);
    let expected = expected_value(doc, command, target);
    let details = VerificationDetails {
        command,
        target: locator.as_target(),
        element_tag: info.tag,
        element_id: info.id,
        element_class: info.class,
    };
    Ok(ActionRecord::verification(
        details,
        expected,
        locator.to_string(),
        url,
        now,
    ))
}

fn expected_value(doc: &Document, command: VerificationCommand, target: NodeId) -> String {
    let text = || doc.text_content(target).trim().to_string();
    let control_value = || {
        matches!(doc.tag_name(target), Some("input" | "textarea"))
            .then(|| doc.value(target).unwrap_or_default().to_string())
    };
    match command.expected_value_source() {
        ExpectedValueSource::Title => doc.title(),
        ExpectedValueSource::Text | ExpectedValueSource::Value => {
            control_value().unwrap_or_else(text)
        }
        ExpectedValueSource::Nothing => String::new(),
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
