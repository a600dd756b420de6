//! Text spans: the unit the translator works on.

use crate::model::{EmphasisSet, NodeId};

/// Kind of content a span holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    /// Ordinary print text
    #[default]
    Standard,
    /// A whole math expression
    Math,
}

/// Where the translation of a span is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    /// Right after the text node
    After(NodeId),
    /// As last child of the element
    LastChild(NodeId),
}

/// An immutable run of translatable text.
///
/// Builders return new spans; a span is never modified in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    node: NodeId,
    text: String,
    content: ContentType,
    emphasis: EmphasisSet,
    translated: bool,
    attach: Attach,
}

impl TextSpan {
    /// Span for a text node; the translation goes right after it.
    pub fn text(node: NodeId, text: impl Into<String>) -> Self {
        Self {
            node,
            text: text.into(),
            content: ContentType::Standard,
            emphasis: EmphasisSet::default(),
            translated: false,
            attach: Attach::After(node),
        }
    }

    /// Span generated from an element (attribute text, math); the
    /// translation becomes the element's last child.
    pub fn inserted(element: NodeId, text: impl Into<String>) -> Self {
        Self {
            attach: Attach::LastChild(element),
            ..Self::text(element, text)
        }
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    pub fn with_emphasis(&self, emphasis: EmphasisSet) -> Self {
        Self {
            emphasis,
            ..self.clone()
        }
    }

    pub fn with_content(&self, content: ContentType) -> Self {
        Self {
            content,
            ..self.clone()
        }
    }

    /// Mark the span as translated.
    pub fn translated(&self) -> Self {
        Self {
            translated: true,
            ..self.clone()
        }
    }

    /// Source node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn content(&self) -> ContentType {
        self.content
    }

    pub fn emphasis(&self) -> EmphasisSet {
        self.emphasis
    }

    pub fn is_translated(&self) -> bool {
        self.translated
    }

    pub fn attach(&self) -> Attach {
        self.attach
    }

    /// Whether the text is already braille.
    pub fn is_no_translate(&self) -> bool {
        self.emphasis.no_translate
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_return_new_spans() {
        let span = TextSpan::text(NodeId(3), "Hello");
        let bold = span.with_emphasis(EmphasisSet::parse("bold"));
        assert!(!span.emphasis().bold);
        assert!(bold.emphasis().bold);
        assert_eq!(bold.attach(), Attach::After(NodeId(3)));

        let done = bold.translated();
        assert!(!bold.is_translated());
        assert!(done.is_translated());
    }

    #[test]
    fn test_inserted_span() {
        let span = TextSpan::inserted(NodeId(1), "a/b").with_content(ContentType::Math);
        assert_eq!(span.attach(), Attach::LastChild(NodeId(1)));
        assert_eq!(span.content(), ContentType::Math);
        assert_eq!(span.len(), 3);
    }
}
