//! Arena-backed document tree.
//!
//! Removing a node only detaches it, so a stale [`NodeId`] held across a
//! mutation still resolves and can be checked with
//! [`Document::is_attached`]. Detached nodes stay allocated until
//! [`Document::compact`] runs; each redact and restore cycle leaves a few
//! behind.

use hush_core::{HushError, Result};
use std::collections::HashMap;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into().to_ascii_lowercase(), attrs: Vec::new() }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// An empty document: just the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node { parent: None, children: Vec::new(), data: NodeData::Document }],
            root: NodeId(0),
        }
    }

    /// Build from HTML. Parsing never fails; malformed markup is repaired
    /// the way browsers do it.
    pub fn parse_html(html: &str) -> Self {
        use scraper::Node as HtmlNode;

        let parsed = scraper::Html::parse_document(html);
        let mut doc = Self::new();
        let root = doc.root;
        let mut ids = HashMap::new();

        for node in parsed.tree.root().descendants() {
            let parent = node
                .parent()
                .and_then(|p| ids.get(&p.id()).copied())
                .unwrap_or(root);
            let id = match node.value() {
                HtmlNode::Element(el) => {
                    let id = doc.create_element(el.name());
                    for (k, v) in el.attrs() {
                        doc.set_attribute(id, k, v);
                    }
                    id
                }
                HtmlNode::Text(text) => doc.create_text(&**text),
                HtmlNode::Comment(comment) => doc.create_comment(&**comment),
                _ => continue,
            };
            doc.append_child(parent, id);
            ids.insert(node.id(), id);
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element, or the root when there is none.
    pub fn body(&self) -> NodeId {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.element(id).is_some_and(|e| e.name == "body"))
            .unwrap_or(self.root)
    }

    /// Allocated nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.0].children.is_empty()
    }

    // ========== Construction ==========

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent: None, children: Vec::new(), data });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(name)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    /// Append `child` under `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    // ========== Access ==========

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Value of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> bool {
        match &mut self.nodes[id.0].data {
            NodeData::Text(t) => {
                value.clone_into(t);
                true
            }
            _ => false,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                e.set_attr(name, value);
                true
            }
            None => false,
        }
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    ///
    /// Returns a snapshot, so callers may mutate the tree while iterating it.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.text(d))
            .collect()
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.element(id).and_then(|e| e.id()) == Some(element_id))
    }

    pub fn elements_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|e| e.has_class(class)))
            .collect()
    }

    // ========== Mutation ==========

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Detach a node (and its subtree) from the tree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Put `replacements` where `node` was, in order, in one step.
    ///
    /// Fails with [`HushError::Detached`] when `node` has no parent.
    pub fn replace_with(&mut self, node: NodeId, replacements: &[NodeId]) -> Result<()> {
        let parent = self.nodes[node.0].parent.ok_or(HushError::Detached)?;
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == node)
            .ok_or(HushError::Detached)?;
        for &r in replacements {
            self.detach(r);
            self.nodes[r.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(pos..=pos, replacements.iter().copied());
        self.nodes[node.0].parent = None;
        Ok(())
    }

    /// Merge adjacent text nodes and drop empty ones, throughout the subtree.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            if self.text(child) == Some("") {
                self.nodes[child.0].parent = None;
                continue;
            }
            let prev_text = kept.last().copied().filter(|&p| self.text(p).is_some());
            if let (Some(prev), Some(tail)) = (prev_text, self.text(child)) {
                let tail = tail.to_string();
                if let NodeData::Text(t) = &mut self.nodes[prev.0].data {
                    t.push_str(&tail);
                }
                self.nodes[child.0].parent = None;
                continue;
            }
            kept.push(child);
            self.normalize(child);
        }
        self.nodes[id.0].children = kept;
    }

    /// Free every node no longer reachable from the root and renumber the
    /// rest in document order. Returns how many nodes were dropped.
    ///
    /// Every [`NodeId`] obtained before the call is invalidated, including
    /// ids of nodes that survive.
    pub fn compact(&mut self) -> usize {
        let before = self.nodes.len();
        let mut order = vec![self.root];
        order.extend(self.descendants(self.root));
        let remap: HashMap<NodeId, NodeId> =
            order.iter().enumerate().map(|(new, &old)| (old, NodeId(new))).collect();

        let mut slots: Vec<Option<Node>> = std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        self.nodes = order
            .iter()
            .filter_map(|old| slots[old.0].take())
            .map(|mut node| {
                node.parent = node.parent.and_then(|p| remap.get(&p).copied());
                for child in &mut node.children {
                    if let Some(&new) = remap.get(child) {
                        *child = new;
                    }
                }
                node
            })
            .collect();
        self.root = NodeId(0);
        before - self.nodes.len()
    }

    // ========== Serialization ==========

    /// Serialize the subtree as HTML. The root serializes its children only.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Document => {
                for &c in self.children(id) {
                    self.write_html(c, out);
                }
            }
            NodeData::Text(t) => out.push_str(&escape_text(t)),
            NodeData::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.name);
                for (k, v) in e.attrs() {
                    out.push_str(&format!(" {k}=\"{}\"", escape_attr(v)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&e.name.as_str()) {
                    return;
                }
                for &c in self.children(id) {
                    self.write_html(c, out);
                }
                out.push_str(&format!("</{}>", e.name));
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
