//! Arena-backed DOM model.
//!
//! Pages are held as a flat arena of nodes addressed by [`NodeId`]. Parent
//! links are plain indices so upward walks are simple loops and detached
//! subtrees are just nodes whose ancestor chain never reaches the document.

mod document;
mod html;

pub use document::{Document, ElementData, NodeId, NodeKind};

#[cfg(test)]
#[path = "dom_tests.rs"]
mod tests;
