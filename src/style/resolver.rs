//! Node -> (style, action) resolution.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use regex::Regex;

use super::action::Action;
use super::rules::RuleSet;
use super::sheet::{Style, StyleDef, StyleSheet, DEFAULT_STYLE};
use crate::error::{Error, Result};
use crate::model::{BlockType, ContainerType, Document, ElementKind, InlineType, NodeId};

/// Attribute naming a style that overrides every rule.
pub const OVERRIDE_ATTR: &str = "overrideStyle";

/// Prefix of per-node style option attributes.
pub const OPTION_PREFIX: &str = "opt-";

/// Where a style can come from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupSource {
    /// The node's `overrideStyle` attribute
    NodeOverride,
    /// Rules supplied with the document
    DocumentRules,
    /// Synthetic list-item and margin styles
    ListMargin,
    /// Configured rules
    BaseRules,
}

/// Default lookup order.
pub const DEFAULT_SOURCES: [LookupSource; 4] = [
    LookupSource::NodeOverride,
    LookupSource::DocumentRules,
    LookupSource::ListMargin,
    LookupSource::BaseRules,
];

/// Outcome of a style lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// The node was already being resolved further up the call chain
    Cycle,
}

impl<T> Lookup<T> {
    /// The value, treating a cycle like a miss.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound | Lookup::Cycle => None,
        }
    }
}

/// Style and action of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// `None` means "use the ancestor's style"
    pub style: Option<Arc<Style>>,
    pub action: Action,
}

/// Resolves nodes against the configured styles and rules.
///
/// Synthetic and dynamic styles are generated on first use and memoized by
/// name, so the resolver can be shared between threads.
pub struct StyleResolver {
    sheet: StyleSheet,
    rules: RuleSet,
    sources: Vec<LookupSource>,
    generated: Mutex<HashMap<String, Arc<Style>>>,
    synthetic_name: Regex,
}

impl StyleResolver {
    /// Create a resolver with the default lookup order.
    pub fn new(sheet: StyleSheet, rules: RuleSet) -> Result<Self> {
        let synthetic_name = Regex::new(r"^(?P<prefix>[A-Za-z]*)(?P<indent>\d+)-(?P<runover>\d+)$")
            .map_err(|e| Error::Config(e.to_string()))?;
        for rule in &rules.styles {
            if !sheet.contains(&rule.style) && !synthetic_name.is_match(&rule.style) {
                return Err(Error::Config(format!(
                    "style rule refers to unknown style \"{}\"",
                    rule.style
                )));
            }
        }
        Ok(Self {
            sheet,
            rules,
            sources: DEFAULT_SOURCES.to_vec(),
            generated: Mutex::new(HashMap::new()),
            synthetic_name,
        })
    }

    /// Replace the lookup order.
    pub fn with_sources(mut self, sources: Vec<LookupSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Lookup order in effect.
    pub fn sources(&self) -> &[LookupSource] {
        &self.sources
    }

    /// The configured styles.
    pub fn sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// The configured rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Number of generated (synthetic or dynamic) styles so far.
    pub fn generated_count(&self) -> usize {
        self.generated
            .lock()
            .map(|g| g.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    /// Resolve style and action of a node.
    pub fn resolve(
        &self,
        doc: &Document,
        node: NodeId,
        doc_rules: Option<&RuleSet>,
    ) -> Result<Resolved> {
        Ok(Resolved {
            style: self.style(doc, node, doc_rules)?,
            action: self.action(doc, node, doc_rules),
        })
    }

    /// Style of a node, `None` when no source matches.
    pub fn style(
        &self,
        doc: &Document,
        node: NodeId,
        doc_rules: Option<&RuleSet>,
    ) -> Result<Option<Arc<Style>>> {
        let mut visited = HashSet::new();
        Ok(self.lookup(doc, node, doc_rules, &mut visited)?.found())
    }

    /// Style of a node, or of its nearest styled ancestor, or the root style.
    pub fn effective_style(
        &self,
        doc: &Document,
        node: NodeId,
        doc_rules: Option<&RuleSet>,
    ) -> Result<Arc<Style>> {
        for id in std::iter::once(node).chain(doc.ancestors(node)) {
            if let Some(style) = self.style(doc, id, doc_rules)? {
                return Ok(style);
            }
        }
        Ok(self.sheet.default_style())
    }

    /// Action of a node. Unmatched nodes get [`Action::Generic`].
    pub fn action(&self, doc: &Document, node: NodeId, doc_rules: Option<&RuleSet>) -> Action {
        if let Some(action) = doc_rules.and_then(|r| r.match_action(doc, node)) {
            return action.clone();
        }
        if let Some(action) = self.rules.match_action(doc, node) {
            return action.clone();
        }
        match doc.element(node).map(|e| e.kind()) {
            Some(ElementKind::Inline(InlineType::Emphasis)) => Action::Emphasis(Default::default()),
            Some(ElementKind::Inline(InlineType::NoTranslate)) => Action::NoTranslate,
            Some(ElementKind::Head) => Action::Skip,
            _ => Action::Generic,
        }
    }

    /// Full lookup including dynamic options, guarded by `visited`.
    pub fn lookup(
        &self,
        doc: &Document,
        node: NodeId,
        doc_rules: Option<&RuleSet>,
        visited: &mut HashSet<NodeId>,
    ) -> Result<Lookup<Arc<Style>>> {
        if !visited.insert(node) {
            log::debug!("Style lookup re-entered node {:?}", node);
            return Ok(Lookup::Cycle);
        }
        let base = self.lookup_base(doc, node, doc_rules)?;
        let options = dynamic_options(doc, node);
        if options.is_empty() {
            return Ok(match base {
                Some(style) => Lookup::Found(style),
                None => Lookup::NotFound,
            });
        }

        let base = match base {
            Some(style) => style,
            None => match doc.parent(node) {
                Some(parent) => match self.lookup(doc, parent, doc_rules, visited)? {
                    Lookup::Found(style) => style,
                    Lookup::NotFound => self.inherited(doc, parent, doc_rules, visited)?,
                    Lookup::Cycle => return Ok(Lookup::Cycle),
                },
                None => self.sheet.default_style(),
            },
        };

        let name = options
            .iter()
            .fold(base.name.clone(), |acc, (k, v)| format!("{}+{}={}", acc, k, v));
        if let Some(style) = self.memo_get(&name) {
            return Ok(Lookup::Found(style));
        }
        let mut def = StyleDef::default();
        for (field, value) in &options {
            def.set_option(field, value).map_err(|msg| {
                Error::structural(
                    format!("Invalid style option {}{}: {}", OPTION_PREFIX, field, msg),
                    doc.snippet(node),
                )
            })?;
        }
        let style = Arc::new(def.apply(&name, &base));
        log::debug!("Generated dynamic style {}", name);
        Ok(Lookup::Found(self.memo_insert(name, style)))
    }

    /// Style inherited from the nearest styled ancestor of `node` (inclusive).
    fn inherited(
        &self,
        doc: &Document,
        node: NodeId,
        doc_rules: Option<&RuleSet>,
        visited: &mut HashSet<NodeId>,
    ) -> Result<Arc<Style>> {
        for id in doc.ancestors(node) {
            if let Lookup::Found(style) = self.lookup(doc, id, doc_rules, visited)? {
                return Ok(style);
            }
        }
        Ok(self.sheet.default_style())
    }

    /// Consult the lookup sources in order.
    fn lookup_base(
        &self,
        doc: &Document,
        node: NodeId,
        doc_rules: Option<&RuleSet>,
    ) -> Result<Option<Arc<Style>>> {
        if !doc.is_element(node) {
            return Ok(None);
        }
        for source in &self.sources {
            let found = match source {
                LookupSource::NodeOverride => match doc.attr(node, OVERRIDE_ATTR) {
                    Some(name) => {
                        let style = self.named_style(name);
                        if style.is_none() {
                            log::warn!("Unknown override style \"{}\", falling back to rules", name);
                        }
                        style
                    }
                    None => None,
                },
                LookupSource::DocumentRules => doc_rules
                    .and_then(|r| r.match_style(doc, node))
                    .and_then(|name| self.named_style(name)),
                LookupSource::ListMargin => self.list_margin_style(doc, node)?,
                LookupSource::BaseRules => self
                    .rules
                    .match_style(doc, node)
                    .and_then(|name| self.named_style(name)),
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// A configured style, or a synthetic one when the name has the
    /// `<prefix><indent>-<runover>` shape.
    pub fn named_style(&self, name: &str) -> Option<Arc<Style>> {
        if let Some(style) = self.sheet.get(name) {
            return Some(style);
        }
        let caps = self.synthetic_name.captures(name)?;
        let indent: usize = caps.name("indent")?.as_str().parse().ok()?;
        let runover: usize = caps.name("runover")?.as_str().parse().ok()?;
        let base = if self.sheet.contains("margin") {
            "margin"
        } else {
            DEFAULT_STYLE
        };
        Some(self.synthetic(name, base, indent, runover))
    }

    /// Synthetic style for list items and margin blocks.
    fn list_margin_style(&self, doc: &Document, node: NodeId) -> Result<Option<Arc<Style>>> {
        let Some(element) = doc.element(node) else {
            return Ok(None);
        };
        match element.kind() {
            ElementKind::Block(BlockType::ListItem) => {
                let Some(list) = doc.ancestors(node).find(|a| is_list(doc, *a)) else {
                    return Ok(None);
                };
                let list_type = doc.attr(list, "listType");
                let Some(rule) = self.rules.lists.iter().find(|r| r.accepts(list_type)) else {
                    log::debug!("No list rule for list type {:?}", list_type);
                    return Ok(None);
                };
                let list_level = match doc.attr(list, "listLevel") {
                    Some(v) => parse_level(doc, list, "listLevel", v)?,
                    None => doc.ancestors(list).filter(|a| is_list(doc, *a)).count(),
                };
                let item_level = match doc.attr(node, "itemLevel") {
                    Some(v) => parse_level(doc, node, "itemLevel", v)?,
                    None => list_level,
                };
                let indent = 2 * item_level + 1;
                let runover = 2 * list_level + 3;
                let name = format!("{}{}-{}", rule.prefix, indent, runover);
                Ok(Some(self.synthetic(&name, &rule.base, indent, runover)))
            }
            ElementKind::Block(BlockType::Margin) => {
                let margin_type = element.attr("marginType");
                let Some(rule) = self.rules.margins.iter().find(|r| r.accepts(margin_type)) else {
                    return Ok(None);
                };
                let indent_level = match element.attr("indentLevel") {
                    Some(v) => parse_level(doc, node, "indentLevel", v)?,
                    None => 0,
                };
                let runover_level = match element.attr("runoverLevel") {
                    Some(v) => parse_level(doc, node, "runoverLevel", v)?,
                    None => indent_level,
                };
                let indent = 2 * indent_level + 1;
                let runover = 2 * runover_level + 1;
                let name = format!("{}{}-{}", rule.prefix, indent, runover);
                Ok(Some(self.synthetic(&name, &rule.base, indent, runover)))
            }
            _ => Ok(None),
        }
    }

    /// Memoized synthetic style with 1-based indent/runover cells.
    fn synthetic(&self, name: &str, base: &str, indent: usize, runover: usize) -> Arc<Style> {
        if let Some(style) = self.memo_get(name) {
            return style;
        }
        let parent = self.sheet.get(base).unwrap_or_else(|| {
            log::warn!("Unknown base style \"{}\" for {}, using {}", base, name, DEFAULT_STYLE);
            self.sheet.default_style()
        });
        let def = StyleDef::default().with_indent(indent.saturating_sub(1), runover.saturating_sub(1));
        let style = Arc::new(def.apply(name, &parent));
        self.memo_insert(name.to_string(), style)
    }

    fn memo_get(&self, name: &str) -> Option<Arc<Style>> {
        let generated = self.generated.lock().unwrap_or_else(|e| e.into_inner());
        generated.get(name).cloned()
    }

    fn memo_insert(&self, name: String, style: Arc<Style>) -> Arc<Style> {
        let mut generated = self.generated.lock().unwrap_or_else(|e| e.into_inner());
        generated.entry(name).or_insert(style).clone()
    }
}

fn is_list(doc: &Document, id: NodeId) -> bool {
    matches!(
        doc.element(id).map(|e| e.kind()),
        Some(ElementKind::Container(ContainerType::List))
    )
}

fn parse_level(doc: &Document, node: NodeId, attr: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        Error::structural(
            format!("{} \"{}\" is not a non-negative number", attr, value),
            doc.snippet(node),
        )
    })
}

/// `opt-*` attributes of a node, sorted by field name.
fn dynamic_options(doc: &Document, node: NodeId) -> Vec<(String, String)> {
    match doc.element(node) {
        Some(e) => e
            .attrs
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(OPTION_PREFIX)
                    .map(|field| (field.to_string(), v.clone()))
            })
            .collect(),
        None => Vec::new(),
    }
}
