//! Change detection for page snapshots.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

use crate::dom::Document;

/// Tags whose contents never appear in a snapshot body.
const STRIPPED_TAGS: [&str; 2] = ["script", "style"];

/// Markup and styles of a page, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotBody {
    pub html: String,
    pub css: String,
}

impl SnapshotBody {
    pub fn capture(doc: &Document) -> Self {
        Self {
            html: doc.serialize(doc.root(), &STRIPPED_TAGS),
            css: doc.stylesheet_text(),
        }
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.html.hash(&mut hasher);
        self.css.hash(&mut hasher);
        hasher.finish()
    }
}

/// Lets a snapshot through only when markup or styles changed since the
/// last one that was let through.
#[derive(Debug, Default)]
pub struct SnapshotGate {
    last: Mutex<Option<u64>>,
}

impl SnapshotGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&self, body: &SnapshotBody) -> bool {
        let fingerprint = body.fingerprint();
        let mut last = self.last.lock();
        if *last == Some(fingerprint) {
            return false;
        }
        *last = Some(fingerprint);
        true
    }
}
