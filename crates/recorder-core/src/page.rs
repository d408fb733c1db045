//! A loaded page and the DOM events it produces.

use recorder_protocols::VerificationCommand;

use crate::dom::{Document, NodeId};

/// `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}

/// A page as seen by the recorder.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub document: Document,
    pub ready_state: ReadyState,
}

impl Page {
    pub fn new(url: impl Into<String>, document: Document) -> Self {
        Self {
            url: url.into(),
            document,
            ready_state: ReadyState::Loading,
        }
    }

    /// A page whose load has already completed.
    pub fn loaded(url: impl Into<String>, document: Document) -> Self {
        Self {
            ready_state: ReadyState::Complete,
            ..Self::new(url, document)
        }
    }
}

/// User and navigation events the recorder listens for.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    Click { target: NodeId, x: f64, y: f64 },
    Change { target: NodeId },
    Submit { target: NodeId },
    PopState,
    HashChange,
    /// The window `load` event.
    Load,
    /// A verification command chosen from the context menu.
    Verification {
        command: VerificationCommand,
        target: NodeId,
    },
}
