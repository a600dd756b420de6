//! Node predicates used to bind styles and actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{local_part, prefix_part, Document, NodeId};

/// Delegation deeper than this is treated as a failed match.
pub const MAX_DELEGATION_DEPTH: usize = 16;

/// A predicate over a node.
///
/// Matchers are plain data so rule sets can be read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "camelCase")]
pub enum Matcher {
    /// Matches every node
    Any,
    /// Element with this qualified name; the prefix is resolved in the rule
    /// set's namespace map
    Name { name: String },
    /// Element carrying an attribute (optionally with a given value)
    Attr {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Text node
    Text,
    /// Parent matches
    Parent { matcher: Box<Matcher> },
    /// Some ancestor matches
    Ancestor { matcher: Box<Matcher> },
    /// The nearest ancestor satisfying `bound` matches `matcher`
    NearestAncestor {
        bound: Box<Matcher>,
        matcher: Box<Matcher>,
    },
    /// Named matcher from the rule set
    Delegate { name: String },
    /// All of the matchers match
    All { matchers: Vec<Matcher> },
    /// At least one matcher matches
    AnyOf { matchers: Vec<Matcher> },
    /// The matcher does not match
    Not { matcher: Box<Matcher> },
}

/// Names and namespaces a matcher is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// Prefix -> namespace URI
    pub namespaces: &'a BTreeMap<String, String>,
    /// Named matchers for [`Matcher::Delegate`]
    pub named: &'a BTreeMap<String, Matcher>,
}

impl Matcher {
    /// Element name matcher.
    pub fn name(name: impl Into<String>) -> Self {
        Matcher::Name { name: name.into() }
    }

    /// Attribute equality matcher.
    pub fn attr(name: impl Into<String>, value: impl Into<String>) -> Self {
        Matcher::Attr {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Attribute presence matcher.
    pub fn has_attr(name: impl Into<String>) -> Self {
        Matcher::Attr {
            name: name.into(),
            value: None,
        }
    }

    /// Element with a given name and `type` attribute.
    pub fn typed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Matcher::All {
            matchers: vec![Matcher::name(name), Matcher::attr("type", ty)],
        }
    }

    /// Conjunction with another matcher.
    pub fn and(self, other: Matcher) -> Self {
        match self {
            Matcher::All { mut matchers } => {
                matchers.push(other);
                Matcher::All { matchers }
            }
            first => Matcher::All {
                matchers: vec![first, other],
            },
        }
    }

    /// Evaluate against a node.
    pub fn matches(&self, doc: &Document, node: NodeId, ctx: &MatchContext<'_>) -> bool {
        self.eval(doc, node, ctx, 0)
    }

    fn eval(&self, doc: &Document, node: NodeId, ctx: &MatchContext<'_>, depth: usize) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Text => doc.is_text(node),
            Matcher::Name { name } => {
                let Some(element) = doc.element(node) else {
                    return false;
                };
                if element.local_name() != local_part(name) {
                    return false;
                }
                match prefix_part(name) {
                    Some(prefix) => match ctx.namespaces.get(prefix) {
                        Some(uri) => element.namespace.as_deref() == Some(uri.as_str()),
                        // Undeclared prefix: compare literally
                        None => element.name == *name,
                    },
                    None => match ctx.namespaces.get("") {
                        Some(uri) => {
                            element.namespace.is_none()
                                || element.namespace.as_deref() == Some(uri.as_str())
                        }
                        None => element.namespace.is_none() || prefix_part(&element.name).is_none(),
                    },
                }
            }
            Matcher::Attr { name, value } => match doc.attr(node, name) {
                Some(actual) => value.as_deref().map(|v| v == actual).unwrap_or(true),
                None => false,
            },
            Matcher::Parent { matcher } => doc
                .parent(node)
                .map(|p| matcher.eval(doc, p, ctx, depth))
                .unwrap_or(false),
            Matcher::Ancestor { matcher } => doc
                .ancestors(node)
                .any(|a| matcher.eval(doc, a, ctx, depth)),
            Matcher::NearestAncestor { bound, matcher } => doc
                .ancestors(node)
                .find(|a| bound.eval(doc, *a, ctx, depth))
                .map(|a| matcher.eval(doc, a, ctx, depth))
                .unwrap_or(false),
            Matcher::Delegate { name } => {
                if depth >= MAX_DELEGATION_DEPTH {
                    log::warn!("Matcher delegation through \"{}\" is too deep", name);
                    return false;
                }
                match ctx.named.get(name) {
                    Some(target) => target.eval(doc, node, ctx, depth + 1),
                    None => {
                        log::warn!("Unknown matcher \"{}\"", name);
                        false
                    }
                }
            }
            Matcher::All { matchers } => matchers.iter().all(|m| m.eval(doc, node, ctx, depth)),
            Matcher::AnyOf { matchers } => matchers.iter().any(|m| m.eval(doc, node, ctx, depth)),
            Matcher::Not { matcher } => !matcher.eval(doc, node, ctx, depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    const MATHML: &str = "http://www.w3.org/1998/Math/MathML";

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::empty();
        let root = doc.root();
        let list = doc.append_element(
            root,
            Element::new("container")
                .with_attr("type", "list")
                .with_attr("listType", "bullet"),
        );
        let item = doc.append_element(list, Element::new("block").with_attr("type", "listItem"));
        let math = doc.append_element(item, Element::new("m:math").with_namespace(MATHML));
        (doc, list, item, math)
    }

    fn run(m: &Matcher, doc: &Document, node: NodeId, named: &BTreeMap<String, Matcher>) -> bool {
        let mut ns = BTreeMap::new();
        ns.insert("mml".to_string(), MATHML.to_string());
        let ctx = MatchContext {
            namespaces: &ns,
            named,
        };
        m.matches(doc, node, &ctx)
    }

    #[test]
    fn test_name_and_attr() {
        let (doc, list, item, math) = sample();
        let named = BTreeMap::new();
        assert!(run(&Matcher::typed("block", "listItem"), &doc, item, &named));
        assert!(!run(&Matcher::typed("block", "heading"), &doc, item, &named));
        assert!(run(&Matcher::has_attr("listType"), &doc, list, &named));
        // Prefix resolved through the rule namespace map, not the document's
        assert!(run(&Matcher::name("mml:math"), &doc, math, &named));
        assert!(!run(&Matcher::name("math"), &doc, math, &named));
    }

    #[test]
    fn test_ancestors() {
        let (doc, _, item, math) = sample();
        let named = BTreeMap::new();
        let in_list = Matcher::Ancestor {
            matcher: Box::new(Matcher::typed("container", "list")),
        };
        assert!(run(&in_list, &doc, math, &named));
        assert!(run(
            &Matcher::Parent {
                matcher: Box::new(Matcher::name("container"))
            },
            &doc,
            item,
            &named
        ));

        // Only the nearest container is tested
        let nearest = Matcher::NearestAncestor {
            bound: Box::new(Matcher::name("container")),
            matcher: Box::new(Matcher::attr("listType", "numbered")),
        };
        assert!(!run(&nearest, &doc, math, &named));
    }

    #[test]
    fn test_delegate_and_combinators() {
        let (doc, _, item, _) = sample();
        let mut named = BTreeMap::new();
        named.insert("item".to_string(), Matcher::typed("block", "listItem"));
        named.insert(
            "loop".to_string(),
            Matcher::Delegate {
                name: "loop".to_string(),
            },
        );

        let delegate = Matcher::Delegate {
            name: "item".to_string(),
        };
        assert!(run(&delegate, &doc, item, &named));
        assert!(!run(
            &Matcher::Not {
                matcher: Box::new(delegate.clone())
            },
            &doc,
            item,
            &named
        ));
        assert!(run(
            &Matcher::AnyOf {
                matchers: vec![Matcher::Text, delegate]
            },
            &doc,
            item,
            &named
        ));
        // Self-delegation stops at the depth bound
        let looping = Matcher::Delegate {
            name: "loop".to_string(),
        };
        assert!(!run(&looping, &doc, item, &named));
    }

    #[test]
    fn test_matcher_json() {
        let m: Matcher = serde_json::from_str(
            r#"{"match":"all","matchers":[{"match":"name","name":"block"},{"match":"attr","name":"type","value":"heading"}]}"#,
        )
        .unwrap();
        assert_eq!(m, Matcher::typed("block", "heading"));
    }
}
