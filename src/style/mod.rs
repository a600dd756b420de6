//! Style and action resolution.
//!
//! Styles are named layout policies with single inheritance; actions say how
//! a node's content becomes text spans. Both are bound to nodes through
//! ordered (matcher, value) rules. The [`StyleResolver`] consults its lookup
//! sources first to last:
//!
//! 1. the node's `overrideStyle` attribute,
//! 2. rules supplied with the document,
//! 3. synthetic list/margin styles (`<prefix><indent>-<runover>`),
//! 4. the configured base rules.

mod action;
mod matcher;
mod resolver;
mod rules;
mod sheet;

pub use action::Action;
pub use matcher::{MatchContext, Matcher, MAX_DELEGATION_DEPTH};
pub use resolver::{
    Lookup, LookupSource, Resolved, StyleResolver, DEFAULT_SOURCES, OPTION_PREFIX, OVERRIDE_ATTR,
};
pub use rules::{ActionRule, ListRule, MarginRule, RuleSet, StyleRule};
pub use sheet::{Align, FormatKind, Style, StyleDef, StyleSheet, DEFAULT_STYLE};
