//! Per-field suggestion markers.
//!
//! A marker is a small `?` button placed on the page for each suggestion
//! whose field can be found. Its state is a projection of the last review
//! outcome for that field.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use recorder_core::{Document, NodeId};
use recorder_protocols::{FieldIdentity, Suggestion};
use tracing::debug;

/// Class carried by every marker element.
pub const MARKER_CLASS: &str = "input-suggestion-btn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerState {
    #[default]
    Default,
    Confirmed,
    Cancelled,
    Submitted,
    Failed,
}

impl MarkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerState::Default => "default",
            MarkerState::Confirmed => "confirmed",
            MarkerState::Cancelled => "cancelled",
            MarkerState::Submitted => "submitted",
            MarkerState::Failed => "failed",
        }
    }
}

impl fmt::Display for MarkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub identity: FieldIdentity,
    /// The marker button in the page.
    pub element: NodeId,
    /// The form field the suggestion belongs to.
    pub field: NodeId,
    pub state: MarkerState,
}

/// Markers of the current page, by suggestion index.
#[derive(Debug, Default)]
pub struct MarkerBoard {
    markers: Mutex<BTreeMap<usize, Marker>>,
}

impl MarkerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all markers with one per suggestion whose field is found by
    /// id, falling back to the `name` attribute. Returns how many were
    /// placed.
    pub fn inject(&self, doc: &mut Document, batch: &[Suggestion]) -> usize {
        let stale: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|&n| doc.class_name(n).split_whitespace().any(|c| c == MARKER_CLASS))
            .collect();
        for node in stale {
            doc.detach(node);
        }

        let mut markers = self.markers.lock();
        markers.clear();
        let Some(container) = doc.body().or_else(|| doc.document_element()) else {
            return 0;
        };

        for (idx, suggestion) in batch.iter().enumerate() {
            let Some(field) = find_field(doc, suggestion) else {
                debug!(idx, field = %suggestion.field_label(), "No element for suggestion");
                continue;
            };

            let button = doc.append_element(container, "button");
            doc.set_attribute(button, "id", &format!("suggestion-btn-{idx}"));
            doc.set_attribute(button, "class", MARKER_CLASS);
            doc.set_attribute(button, "data-idx", &idx.to_string());
            doc.set_attribute(button, "data-state", MarkerState::Default.as_str());
            doc.append_text(button, "?");

            markers.insert(
                idx,
                Marker {
                    identity: FieldIdentity::of(idx, suggestion),
                    element: button,
                    field,
                    state: MarkerState::Default,
                },
            );
        }
        debug!(placed = markers.len(), total = batch.len(), "Injected suggestion markers");
        markers.len()
    }

    /// Move a marker to `state`. Returns `false` when there is no marker at
    /// `idx` or it is already in that state.
    pub fn set(&self, idx: usize, state: MarkerState) -> bool {
        let mut markers = self.markers.lock();
        let Some(marker) = markers.get_mut(&idx) else {
            return false;
        };
        if marker.state == state {
            return false;
        }
        debug!(idx, from = %marker.state, to = %state, "Marker state changed");
        marker.state = state;
        true
    }

    pub fn state(&self, idx: usize) -> Option<MarkerState> {
        self.markers.lock().get(&idx).map(|m| m.state)
    }

    pub fn get(&self, idx: usize) -> Option<Marker> {
        self.markers.lock().get(&idx).cloned()
    }

    /// The marker whose button is `element`.
    pub fn at_element(&self, element: NodeId) -> Option<Marker> {
        self.markers
            .lock()
            .values()
            .find(|m| m.element == element)
            .cloned()
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.markers.lock().values().cloned().collect()
    }

    /// Write marker states into the page as `data-state` attributes.
    pub fn render(&self, doc: &mut Document) {
        for marker in self.markers.lock().values() {
            doc.set_attribute(marker.element, "data-state", marker.state.as_str());
        }
    }
}

fn find_field(doc: &Document, suggestion: &Suggestion) -> Option<NodeId> {
    if !suggestion.field_id.is_empty() {
        if let Some(node) = doc.get_element_by_id(&suggestion.field_id) {
            return Some(node);
        }
    }
    doc.get_element_by_name(&suggestion.field_name)
}
