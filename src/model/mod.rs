//! Document model for tagged input documents.
//!
//! The document is an arena of nodes (elements, text and translation
//! side-tables) addressed by stable [`NodeId`] handles. Translation output
//! lives in the formatting namespace so it can be stripped and regenerated.

mod document;
mod node;

pub use document::{Ancestors, Children, Document, Metadata};
pub use node::{
    local_part, prefix_part, BlockType, BrlData, ContainerType, Element, ElementKind,
    EmphasisSet, InlineType, Node, NodeData, NodeId, SpanType, FORMAT_NS, FORMAT_PREFIX,
};
