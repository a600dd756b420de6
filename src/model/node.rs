//! Node payloads of the document tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace URI of attributes and elements produced by translation/formatting.
pub const FORMAT_NS: &str = "urn:brlpage:format";

/// Prefix bound to [`FORMAT_NS`] when a document is serialized.
pub const FORMAT_PREFIX: &str = "brl";

/// Handle of a node inside a [`super::Document`] arena.
///
/// Handles stay valid for the lifetime of the document, including across
/// detach and reinsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Index into the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the arena with its tree links.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (None for the root and for detached nodes).
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node.
    pub last_child: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Payload.
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// A structural or inline element.
    Element(Element),
    /// Print text.
    Text(String),
    /// Translation side-table attached next to the text it translates.
    Brl(BrlData),
}

/// An element with a qualified name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the source (e.g. `m:mfrac`).
    pub name: String,
    /// Resolved namespace URI, if any.
    pub namespace: Option<String>,
    /// Attributes keyed by qualified name.
    pub attrs: BTreeMap<String, String>,
}

impl Element {
    /// Create an element without namespace or attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attrs: BTreeMap::new(),
        }
    }

    /// Set an attribute and return self.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the namespace URI and return self.
    pub fn with_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    /// Name without prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    /// The `type` attribute, which selects the subtype of a structural element.
    pub fn type_attr(&self) -> Option<&str> {
        self.attr("type")
    }

    /// Classify the element within the input vocabulary.
    pub fn kind(&self) -> ElementKind {
        if self.namespace.as_deref() == Some(FORMAT_NS) {
            return ElementKind::Other;
        }
        let ty = self.type_attr().unwrap_or("");
        match self.local_name() {
            "document" => ElementKind::Document,
            "head" => ElementKind::Head,
            "section" => ElementKind::Section,
            "pageIndicator" => ElementKind::PageIndicator,
            "container" => ElementKind::Container(match ty {
                "list" => ContainerType::List,
                "table" => ContainerType::Table,
                "tableRow" => ContainerType::TableRow,
                "toc" => ContainerType::Toc,
                "image" => ContainerType::Image,
                _ => ContainerType::Other,
            }),
            "block" => ElementKind::Block(match ty {
                "heading" => BlockType::Heading,
                "listItem" => BlockType::ListItem,
                "margin" => BlockType::Margin,
                "tableCell" => BlockType::TableCell,
                "tocEntry" => BlockType::TocEntry,
                "tocHeading" => BlockType::TocHeading,
                "paragraph" | "" => BlockType::Paragraph,
                _ => BlockType::Other,
            }),
            "span" => ElementKind::Span(match ty {
                "tocPageNumber" => SpanType::TocPageNumber,
                _ => SpanType::Other,
            }),
            "inline" => ElementKind::Inline(match ty {
                "emphasis" => InlineType::Emphasis,
                "math" => InlineType::Math,
                "noTranslate" => InlineType::NoTranslate,
                _ => InlineType::Other,
            }),
            _ => ElementKind::Other,
        }
    }

    /// Whether this element is a translation and layout unit.
    pub fn is_block(&self) -> bool {
        matches!(self.kind(), ElementKind::Block(_))
    }

    /// Whether this attribute belongs to the formatting namespace.
    pub fn is_format_attr(name: &str) -> bool {
        name.strip_prefix(FORMAT_PREFIX)
            .map(|rest| rest.starts_with(':'))
            .unwrap_or(false)
    }
}

/// Strip the prefix from a qualified name.
pub fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, l)| l).unwrap_or(name)
}

/// Prefix of a qualified name, if any.
pub fn prefix_part(name: &str) -> Option<&str> {
    name.split_once(':').map(|(p, _)| p)
}

/// Element vocabulary of input documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Document root.
    Document,
    /// Document head (metadata, never formatted).
    Head,
    /// Generic section.
    Section,
    /// Grouping container.
    Container(ContainerType),
    /// Translation/layout unit.
    Block(BlockType),
    /// Sub-block run.
    Span(SpanType),
    /// Inline markup.
    Inline(InlineType),
    /// Print page change marker.
    PageIndicator,
    /// Anything else (MathML children, head metadata).
    Other,
}

/// Container subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    List,
    Table,
    TableRow,
    Toc,
    Image,
    Other,
}

/// Block subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading,
    ListItem,
    Margin,
    TableCell,
    TocEntry,
    TocHeading,
    Other,
}

/// Span subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanType {
    TocPageNumber,
    Other,
}

/// Inline subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineType {
    Emphasis,
    Math,
    NoTranslate,
    Other,
}

/// Translated text attached to the node it translates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrlData {
    /// Braille text (ASCII braille).
    pub text: String,
    /// For each braille character, the character offset in `original`.
    pub index: Vec<u32>,
    /// The print text that was translated.
    pub original: String,
}

impl BrlData {
    /// Create translated text with its index map.
    pub fn new(text: impl Into<String>, index: Vec<u32>, original: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index,
            original: original.into(),
        }
    }

    /// Number of braille cells.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether there is no braille text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Serialize the index map as a space-separated list.
    pub fn index_string(&self) -> String {
        self.index
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse a space-separated index list.
    pub fn parse_index(s: &str) -> Option<Vec<u32>> {
        s.split_whitespace().map(|p| p.parse().ok()).collect()
    }
}

/// Typeform emphasis carried by text spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmphasisSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub script: bool,
    /// Text is already braille and must pass through untranslated.
    pub no_translate: bool,
}

impl EmphasisSet {
    /// Parse a space-separated list such as `"bold italic"`.
    pub fn parse(s: &str) -> Self {
        let mut set = Self::default();
        for word in s.split(|c: char| c.is_whitespace() || c == ',') {
            match word.to_ascii_lowercase().as_str() {
                "bold" => set.bold = true,
                "italic" | "italics" => set.italic = true,
                "underline" => set.underline = true,
                "script" => set.script = true,
                "notranslate" | "no_translate" | "no-translate" => set.no_translate = true,
                _ => {}
            }
        }
        set
    }

    /// Union of two sets.
    pub fn union(self, other: Self) -> Self {
        Self {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
            script: self.script || other.script,
            no_translate: self.no_translate || other.no_translate,
        }
    }

    /// Whether any typeform is set (excluding no-translate).
    pub fn has_typeform(&self) -> bool {
        self.bold || self.italic || self.underline || self.script
    }

    /// Whether nothing is set.
    pub fn is_empty(&self) -> bool {
        !self.has_typeform() && !self.no_translate
    }
}
