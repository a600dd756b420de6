//! Rule sets binding matchers to styles and actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::matcher::{MatchContext, Matcher};
use crate::model::{Document, NodeId};

/// Binds a matcher to a style name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    pub matcher: Matcher,
    pub style: String,
}

/// Binds a matcher to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRule {
    pub matcher: Matcher,
    pub action: Action,
}

/// Synthetic styles for list items.
///
/// A matching item inside a list of type `list_type` gets the style
/// `<prefix><indent>-<runover>` (1-based cells) derived from its levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRule {
    /// List type of the enclosing container (`*` for any)
    #[serde(default = "any_type")]
    pub list_type: String,
    /// Prefix of the generated style name
    #[serde(default)]
    pub prefix: String,
    /// Style the generated style inherits from
    #[serde(default = "default_list_base")]
    pub base: String,
}

/// Synthetic styles for margin blocks (`indentLevel`/`runoverLevel`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginRule {
    /// Value of the block's `marginType` attribute (`*` for any)
    #[serde(default = "any_type")]
    pub margin_type: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_margin_base")]
    pub base: String,
}

fn any_type() -> String {
    "*".to_string()
}

fn default_list_base() -> String {
    "listItem".to_string()
}

fn default_margin_base() -> String {
    "margin".to_string()
}

impl ListRule {
    /// Whether this rule applies to a list of the given type.
    pub fn accepts(&self, list_type: Option<&str>) -> bool {
        self.list_type == "*" || Some(self.list_type.as_str()) == list_type
    }
}

impl MarginRule {
    /// Whether this rule applies to a margin of the given type.
    pub fn accepts(&self, margin_type: Option<&str>) -> bool {
        self.margin_type == "*" || Some(self.margin_type.as_str()) == margin_type
    }
}

/// An ordered set of rules with its namespace map and named matchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSet {
    /// Prefix -> namespace URI used by `Name` matchers
    pub namespaces: BTreeMap<String, String>,
    /// Matchers reachable through `Delegate`
    pub matchers: BTreeMap<String, Matcher>,
    pub styles: Vec<StyleRule>,
    pub actions: Vec<ActionRule>,
    pub lists: Vec<ListRule>,
    pub margins: Vec<MarginRule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a namespace prefix.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Append a style rule.
    pub fn with_style(mut self, matcher: Matcher, style: impl Into<String>) -> Self {
        self.styles.push(StyleRule {
            matcher,
            style: style.into(),
        });
        self
    }

    /// Append an action rule.
    pub fn with_action(mut self, matcher: Matcher, action: Action) -> Self {
        self.actions.push(ActionRule { matcher, action });
        self
    }

    /// Register a named matcher.
    pub fn with_matcher(mut self, name: impl Into<String>, matcher: Matcher) -> Self {
        self.matchers.insert(name.into(), matcher);
        self
    }

    fn context(&self) -> MatchContext<'_> {
        MatchContext {
            namespaces: &self.namespaces,
            named: &self.matchers,
        }
    }

    /// First style rule matching the node.
    pub fn match_style(&self, doc: &Document, node: NodeId) -> Option<&str> {
        let ctx = self.context();
        self.styles
            .iter()
            .find(|rule| rule.matcher.matches(doc, node, &ctx))
            .map(|rule| rule.style.as_str())
    }

    /// First action rule matching the node.
    pub fn match_action(&self, doc: &Document, node: NodeId) -> Option<&Action> {
        let ctx = self.context();
        self.actions
            .iter()
            .find(|rule| rule.matcher.matches(doc, node, &ctx))
            .map(|rule| &rule.action)
    }

    /// Whether the set has no rules at all.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
            && self.actions.is_empty()
            && self.lists.is_empty()
            && self.margins.is_empty()
    }
}
