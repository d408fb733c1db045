//! HTML import and serialization.

use scraper::Html;
use scraper::node::Node as HtmlNode;

use super::document::{Document, NodeId, NodeKind};

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

impl Document {
    /// Parse an HTML document. Comments, doctypes and processing
    /// instructions are dropped.
    pub fn parse_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Document::new();
        let root = doc.root();
        let mut stack = vec![(html.tree.root(), root)];

        while let Some((source_node, parent)) = stack.pop() {
            for child in source_node.children() {
                match child.value() {
                    HtmlNode::Element(element) => {
                        let id = doc.create_element(element.name());
                        for (name, value) in element.attrs() {
                            doc.set_attribute(id, name, value);
                        }
                        doc.append_child(parent, id);
                        stack.push((child, id));
                    }
                    HtmlNode::Text(text) => {
                        doc.append_text(parent, text);
                    }
                    _ => {}
                }
            }
        }
        doc
    }

    /// Serialize a node and its subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        self.serialize(node, &[])
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.serialize(self.root(), &[])
    }

    /// Serialize a node, leaving out the subtrees of elements whose tag is in
    /// `skip`.
    pub fn serialize(&self, node: NodeId, skip: &[&str]) -> String {
        enum Step {
            Open(NodeId),
            Close(String),
        }

        let mut out = String::new();
        let mut stack = vec![Step::Open(node)];
        while let Some(step) = stack.pop() {
            let current = match step {
                Step::Close(tag) => {
                    out.push_str("</");
                    out.push_str(&tag);
                    out.push('>');
                    continue;
                }
                Step::Open(current) => current,
            };
            match self.kind(current) {
                Some(NodeKind::Text(text)) => out.push_str(&escape(text, false)),
                Some(NodeKind::Element(element)) => {
                    let tag = element.tag_name.as_str();
                    if skip.contains(&tag) {
                        continue;
                    }
                    out.push('<');
                    out.push_str(tag);
                    for (name, value) in &element.attributes {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        out.push_str(&escape(value, true));
                        out.push('"');
                    }
                    out.push('>');
                    if VOID_ELEMENTS.contains(&tag) {
                        continue;
                    }
                    stack.push(Step::Close(tag.to_string()));
                    stack.extend(self.children(current).iter().rev().map(|&c| Step::Open(c)));
                }
                Some(NodeKind::Document) => {
                    stack.extend(self.children(current).iter().rev().map(|&c| Step::Open(c)));
                }
                None => {}
            }
        }
        out
    }

    /// Concatenated text of every connected `<style>` element.
    pub fn stylesheet_text(&self) -> String {
        self.elements()
            .into_iter()
            .filter(|&n| self.tag_name(n) == Some("style"))
            .map(|n| self.text_content(n))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}
