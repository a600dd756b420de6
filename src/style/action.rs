//! Actions: how a node's content turns into text spans.

use serde::{Deserialize, Serialize};

use crate::model::EmphasisSet;

/// Behavior bound to a node through the action rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    /// Children are processed in order
    #[default]
    Generic,
    /// The subtree produces no spans
    Skip,
    /// Literal text inserted while linearizing math: `pre` before the first
    /// child, `mid` between children, `post` after the last one
    Math {
        #[serde(default)]
        pre: String,
        #[serde(default)]
        mid: String,
        #[serde(default)]
        post: String,
    },
    /// The value of attribute `name`, wrapped in `pre`/`post`, is translated
    /// in place of the children
    Attribute {
        name: String,
        #[serde(default)]
        pre: String,
        #[serde(default)]
        post: String,
    },
    /// Descendant text carries these typeforms (plus the node's `emphasis`
    /// attribute)
    Emphasis(EmphasisSet),
    /// Descendant text is already braille
    NoTranslate,
}

impl Action {
    /// Math insertion action.
    pub fn math(pre: &str, mid: &str, post: &str) -> Self {
        Action::Math {
            pre: pre.to_string(),
            mid: mid.to_string(),
            post: post.to_string(),
        }
    }

    /// Whether descendants are skipped entirely.
    pub fn is_skip(&self) -> bool {
        matches!(self, Action::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_json() {
        let a: Action = serde_json::from_str(r#"{"action":"math","pre":"(","mid":")/(","post":")"}"#).unwrap();
        assert_eq!(a, Action::math("(", ")/(", ")"));

        let a: Action = serde_json::from_str(r#"{"action":"emphasis","bold":true}"#).unwrap();
        match a {
            Action::Emphasis(set) => assert!(set.bold && !set.italic),
            other => panic!("unexpected {:?}", other),
        }

        let a: Action = serde_json::from_str(r#"{"action":"skip"}"#).unwrap();
        assert!(a.is_skip());
        assert_eq!(Action::default(), Action::Generic);
    }
}
