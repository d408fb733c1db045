//! Document arena: nodes, attributes and tree edits.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

/// Element payload.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Lower-case tag name.
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    /// Live value of a form control.
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

const FORM_CONTROLS: [&str; 5] = ["input", "textarea", "select", "button", "option"];

/// A page's DOM tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    id_index: HashMap<String, Vec<NodeId>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            id_index: HashMap::new(),
        }
    }

    /// The document node itself (not an element).
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The top-level element, normally `<html>`.
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).next()
    }

    /// The `<body>` child of the document element.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .find(|&c| self.tag_name(c) == Some("body"))
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        let tag_name = tag_name.to_ascii_lowercase();
        let value = FORM_CONTROLS
            .contains(&tag_name.as_str())
            .then(String::new);
        self.push_node(NodeKind::Element(ElementData {
            tag_name,
            attributes: BTreeMap::new(),
            value,
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag_name: &str) -> NodeId {
        let id = self.create_element(tag_name);
        self.append_child(parent, id);
        id
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Ignored when either id is unknown or when it would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || child == self.root() {
            return;
        }
        if parent == child || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Remove a node (and its subtree) from its parent. The nodes stay in the
    /// arena as a detached subtree.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != node);
        self.nodes[node.0].parent = None;
    }

    fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|n| &n.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.kind(node)? {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    /// Lower-case tag name of an element.
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag_name.as_str())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    /// Parent, if it is an element (the document node is not).
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    /// Whether the node's ancestor chain reaches the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root() || self.is_ancestor(self.root(), node)
    }

    /// Connected elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if self.is_element(node) {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "id" {
            self.unindex_id(node);
        }
        let Some(element) = self.element_mut(node) else {
            return;
        };
        if name == "value" && element.value.as_deref().is_none_or(str::is_empty) {
            element.value = Some(value.to_string());
        }
        element.attributes.insert(name.clone(), value.to_string());
        if name == "id" && !value.is_empty() {
            self.id_index.entry(value.to_string()).or_default().push(node);
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if name.eq_ignore_ascii_case("id") {
            self.unindex_id(node);
        }
        if let Some(element) = self.element_mut(node) {
            element.attributes.remove(&name.to_ascii_lowercase());
        }
    }

    fn unindex_id(&mut self, node: NodeId) {
        let Some(old) = self.attribute(node, "id").map(str::to_string) else {
            return;
        };
        if let Some(nodes) = self.id_index.get_mut(&old) {
            nodes.retain(|&n| n != node);
            if nodes.is_empty() {
                self.id_index.remove(&old);
            }
        }
    }

    /// Non-empty `id` attribute.
    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    /// `class` attribute, empty when absent.
    pub fn class_name(&self, node: NodeId) -> &str {
        self.attribute(node, "class").unwrap_or_default()
    }

    /// Connected elements carrying `id`.
    fn connected_with_id(&self, id: &str) -> Vec<NodeId> {
        self.id_index
            .get(id)
            .map(|nodes| {
                nodes
                    .iter()
                    .copied()
                    .filter(|&n| self.is_connected(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First connected element with the given id, in document order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let candidates = self.connected_with_id(id);
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => self
                .elements()
                .into_iter()
                .find(|n| candidates.contains(n)),
        }
    }

    /// Whether `node`'s id identifies it and nothing else in the document.
    pub fn has_unique_id(&self, node: NodeId) -> bool {
        match self.id(node) {
            Some(id) => self.connected_with_id(id) == [node],
            None => false,
        }
    }

    /// First connected element whose `name` attribute equals `name`.
    pub fn get_element_by_name(&self, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }
        self.elements()
            .into_iter()
            .find(|&n| self.attribute(n, "name") == Some(name))
    }

    /// Live value of a form control.
    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node)?.value.as_deref()
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = Some(value.to_string());
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match self.kind(current) {
                Some(NodeKind::Text(text)) => out.push_str(text),
                Some(_) => stack.extend(self.children(current).iter().rev().copied()),
                None => {}
            }
        }
        out
    }

    /// Text of the first `<title>` element, trimmed.
    pub fn title(&self) -> String {
        self.elements()
            .into_iter()
            .find(|&n| self.tag_name(n) == Some("title"))
            .map(|n| self.text_content(n).trim().to_string())
            .unwrap_or_default()
    }
}
