//! Arena-backed document tree.

use super::node::{BrlData, Element, Node, NodeData, NodeId, FORMAT_NS, FORMAT_PREFIX};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum length of a node snippet embedded in error messages.
const SNIPPET_LIMIT: usize = 400;

/// A document tree stored in an arena.
///
/// Nodes are addressed by [`NodeId`]. Every node keeps parent, first/last
/// child and prev/next sibling handles, so detaching and reinserting a node
/// only rewrites a handful of links and never invalidates other handles.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,

    /// Document metadata read from the head.
    pub metadata: Metadata,

    /// Namespace declarations of the root element (prefix -> URI).
    pub namespaces: BTreeMap<String, String>,
}

impl Document {
    /// Create a document whose root is the given element.
    pub fn new(root: Element) -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Element(root))],
            root: NodeId(0),
            metadata: Metadata::default(),
            namespaces: BTreeMap::new(),
        }
    }

    /// Create an empty `<document/>`.
    pub fn empty() -> Self {
        Self::new(Element::new("document"))
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena (attached or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena only holds the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1 && self.first_child(self.root).is_none()
    }

    /// Access a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Whether this handle is valid for this document.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Payload of a node.
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    /// Element payload, if the node is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id).data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Mutable element payload.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id).data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Text payload, if the node is a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Translation payload, if the node is a `Brl` node.
    pub fn brl(&self, id: NodeId) -> Option<&BrlData> {
        match &self.node(id).data {
            NodeData::Brl(b) => Some(b),
            _ => None,
        }
    }

    /// Whether the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element(_))
    }

    /// Whether the node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text(_))
    }

    /// Whether the node is a `Brl` node.
    pub fn is_brl(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Brl(_))
    }

    // ==================== Construction ====================

    /// Allocate a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Allocate an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = self.create(NodeData::Element(element));
        self.append_child(parent, id);
        id
    }

    /// Allocate a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        let id = self.create(NodeData::Text(text.into()));
        self.append_child(parent, id);
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.node(parent).last_child;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }
        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Insert `new` right after `anchor`, detaching it first.
    pub fn insert_after(&mut self, anchor: NodeId, new: NodeId) {
        if anchor == new {
            return;
        }
        self.detach(new);
        let parent = self.node(anchor).parent;
        let next = self.node(anchor).next_sibling;
        {
            let node = self.node_mut(new);
            node.parent = parent;
            node.prev_sibling = Some(anchor);
            node.next_sibling = next;
        }
        self.node_mut(anchor).next_sibling = Some(new);
        match next {
            Some(next) => self.node_mut(next).prev_sibling = Some(new),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = Some(new);
                }
            }
        }
    }

    /// Insert `new` right before `anchor`, detaching it first.
    pub fn insert_before(&mut self, anchor: NodeId, new: NodeId) {
        if anchor == new {
            return;
        }
        self.detach(new);
        let parent = self.node(anchor).parent;
        let prev = self.node(anchor).prev_sibling;
        {
            let node = self.node_mut(new);
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = Some(anchor);
        }
        self.node_mut(anchor).prev_sibling = Some(new);
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(new),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = Some(new);
                }
            }
        }
    }

    /// Unlink a node (and its subtree) from its parent.
    ///
    /// The node keeps its children and can be reinserted later.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = prev;
                }
            }
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    // ==================== Navigation ====================

    /// Parent handle.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// First child handle.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Last child handle.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Next sibling handle.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Previous sibling handle.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Iterate over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Iterate over the ancestors of a node, nearest first (excluding itself).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// All descendants in document order (excluding the node itself).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            let start = stack.len();
            stack.extend(self.children(next));
            stack[start..].reverse();
        }
        out
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// Depth below the root (root = 0).
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Element children with the given local name.
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        local_name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).filter(move |c| {
            self.element(*c)
                .map(|e| e.local_name() == local_name)
                .unwrap_or(false)
        })
    }

    // ==================== Attributes & content ====================

    /// Attribute value of an element.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Set an attribute. Returns false when the node is not an element.
    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                e.attrs.insert(name.into(), value.into());
                true
            }
            None => false,
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.attrs.remove(name))
    }

    /// Concatenated print text of the subtree (translation nodes excluded).
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.text(d))
            .collect()
    }

    /// Concatenated braille text of the subtree.
    pub fn braille_content(&self, id: NodeId) -> String {
        if let Some(b) = self.brl(id) {
            return b.text.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.brl(d))
            .map(|b| b.text.as_str())
            .collect()
    }

    /// Replace the payload of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        match &mut self.node_mut(id).data {
            NodeData::Text(t) => {
                *t = text.into();
                true
            }
            _ => false,
        }
    }

    // ==================== Whole-tree operations ====================

    /// Remove every translation node and every formatting-namespace attribute.
    ///
    /// After this call the document is in the same state as freshly parsed
    /// input, so translation can be rerun.
    pub fn strip_formatting(&mut self) -> usize {
        let mut removed = 0;
        for id in self.descendants(self.root) {
            if self.is_brl(id) {
                self.detach(id);
                removed += 1;
            }
        }
        let all: Vec<NodeId> = std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .collect();
        for id in all {
            if let Some(e) = self.element_mut(id) {
                let before = e.attrs.len();
                e.attrs.retain(|k, _| !Element::is_format_attr(k));
                removed += before - e.attrs.len();
            }
        }
        removed
    }

    /// Copy the subtree rooted at `id` into a new document.
    ///
    /// The copy keeps namespace declarations and metadata. Element payloads
    /// are cloned; handles of the new document are unrelated to this one.
    pub fn clone_subtree(&self, id: NodeId) -> Document {
        let root_data = match &self.node(id).data {
            NodeData::Element(e) => e.clone(),
            other => {
                let mut wrapper = Element::new("document");
                wrapper.namespace = None;
                let mut doc = Document::new(wrapper);
                let copy = doc.create(other.clone());
                let root = doc.root();
                doc.append_child(root, copy);
                doc.namespaces = self.namespaces.clone();
                return doc;
            }
        };
        let mut doc = Document::new(root_data);
        doc.metadata = self.metadata.clone();
        doc.namespaces = self.namespaces.clone();
        let root = doc.root();
        for child in self.children(id) {
            self.copy_into(child, &mut doc, root);
        }
        doc
    }

    /// Deep-copy `id` from this document under `parent` in `target`.
    pub fn copy_into(&self, id: NodeId, target: &mut Document, parent: NodeId) -> NodeId {
        let copy = target.create(self.node(id).data.clone());
        target.append_child(parent, copy);
        for child in self.children(id) {
            self.copy_into(child, target, copy);
        }
        copy
    }

    // ==================== Serialization ====================

    /// Serialize the whole document as XML.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        self.write_node(self.root, true, &mut out);
        out
    }

    /// Serialize a node and its subtree as XML.
    pub fn to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, true, &mut out);
        out
    }

    /// Short XML form of a node for error messages.
    pub fn snippet(&self, id: NodeId) -> String {
        let xml = self.to_xml(id);
        if xml.chars().count() <= SNIPPET_LIMIT {
            return xml;
        }
        let mut cut: String = xml.chars().take(SNIPPET_LIMIT).collect();
        cut.push_str("...");
        cut
    }

    fn write_node(&self, id: NodeId, declare: bool, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(t) => out.push_str(&escape(t.as_str())),
            NodeData::Brl(b) => {
                out.push('<');
                out.push_str(FORMAT_PREFIX);
                out.push_str(":brl");
                if declare {
                    push_attr(out, &format!("xmlns:{}", FORMAT_PREFIX), FORMAT_NS);
                }
                push_attr(out, "index", &b.index_string());
                push_attr(out, "original", &b.original);
                out.push('>');
                out.push_str(&escape(b.text.as_str()));
                out.push_str("</");
                out.push_str(FORMAT_PREFIX);
                out.push_str(":brl>");
            }
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(&e.name);
                if declare {
                    let mut declared_format = false;
                    for (prefix, uri) in &self.namespaces {
                        let key = if prefix.is_empty() {
                            "xmlns".to_string()
                        } else {
                            format!("xmlns:{}", prefix)
                        };
                        if !e.attrs.contains_key(&key) {
                            push_attr(out, &key, uri);
                        }
                        declared_format |= prefix == FORMAT_PREFIX;
                    }
                    let key = format!("xmlns:{}", FORMAT_PREFIX);
                    if !declared_format && !e.attrs.contains_key(&key) {
                        push_attr(out, &key, FORMAT_NS);
                    }
                }
                for (k, v) in &e.attrs {
                    push_attr(out, k, v);
                }
                if self.first_child(id).is_none() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_node(child, false, out);
                }
                out.push_str("</");
                out.push_str(&e.name);
                out.push('>');
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Language tag (e.g., "en")
    pub language: Option<String>,

    /// Other `<meta name=".." content=".."/>` entries
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Record a `<meta>` entry.
    pub fn set(&mut self, name: &str, content: impl Into<String>) {
        let content = content.into();
        match name {
            "title" => self.title = Some(content),
            "author" | "creator" => self.author = Some(content),
            "language" | "lang" => self.language = Some(content),
            _ => {
                self.extra.insert(name.to_string(), content);
            }
        }
    }
}
