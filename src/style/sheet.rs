//! Style definitions and inheritance.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the root style every chain ends in.
pub const DEFAULT_STYLE: &str = "DEFAULT";

/// Horizontal alignment of a block's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// How the formatter treats content carrying a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Flowed paragraphs
    #[default]
    Normal,
    /// Table formatter
    Table,
    /// Table-of-contents formatter
    Toc,
    /// Not formatted at all
    Skip,
}

/// A fully resolved style.
///
/// Indents are 0-based cell offsets from the left margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub name: String,
    pub base: Option<String>,
    /// First-line indent
    pub indent: usize,
    /// Indent of continuation lines
    pub runover: usize,
    pub lines_before: usize,
    pub lines_after: usize,
    pub align: Align,
    pub new_pages_before: usize,
    pub new_pages_after: usize,
    pub keep_with_next: bool,
    pub skip_number_lines: bool,
    /// Centered, with guide dots filling the margins
    pub centered_with_dots: bool,
    /// Blank lines between lines of the block
    pub line_spacing: usize,
    pub format: FormatKind,
}

impl Style {
    /// The root style.
    pub fn root() -> Self {
        Self {
            name: DEFAULT_STYLE.to_string(),
            base: None,
            indent: 0,
            runover: 0,
            lines_before: 0,
            lines_after: 0,
            align: Align::Left,
            new_pages_before: 0,
            new_pages_after: 0,
            keep_with_next: false,
            skip_number_lines: false,
            centered_with_dots: false,
            line_spacing: 0,
            format: FormatKind::Normal,
        }
    }

    /// Effective alignment (centered-with-dots implies centered).
    pub fn effective_align(&self) -> Align {
        if self.centered_with_dots {
            Align::Center
        } else {
            self.align
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::root()
    }
}

/// A partial style as written in configuration.
///
/// Unset fields are inherited from `base` (or from `DEFAULT`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct StyleDef {
    pub base: Option<String>,
    pub indent: Option<usize>,
    pub runover: Option<usize>,
    pub lines_before: Option<usize>,
    pub lines_after: Option<usize>,
    pub align: Option<Align>,
    pub new_pages_before: Option<usize>,
    pub new_pages_after: Option<usize>,
    pub keep_with_next: Option<bool>,
    pub skip_number_lines: Option<bool>,
    pub centered_with_dots: Option<bool>,
    pub line_spacing: Option<usize>,
    pub format: Option<FormatKind>,
}

impl StyleDef {
    /// Create an empty definition inheriting from `base`.
    pub fn based_on(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ..Default::default()
        }
    }

    pub fn with_indent(mut self, indent: usize, runover: usize) -> Self {
        self.indent = Some(indent);
        self.runover = Some(runover);
        self
    }

    pub fn with_lines(mut self, before: usize, after: usize) -> Self {
        self.lines_before = Some(before);
        self.lines_after = Some(after);
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn with_pages(mut self, before: usize, after: usize) -> Self {
        self.new_pages_before = Some(before);
        self.new_pages_after = Some(after);
        self
    }

    pub fn with_keep_with_next(mut self, keep: bool) -> Self {
        self.keep_with_next = Some(keep);
        self
    }

    pub fn with_skip_number_lines(mut self, skip: bool) -> Self {
        self.skip_number_lines = Some(skip);
        self
    }

    pub fn with_format(mut self, format: FormatKind) -> Self {
        self.format = Some(format);
        self
    }

    /// Layer this definition over a resolved parent style.
    pub fn apply(&self, name: &str, parent: &Style) -> Style {
        Style {
            name: name.to_string(),
            base: Some(parent.name.clone()),
            indent: self.indent.unwrap_or(parent.indent),
            runover: self.runover.unwrap_or(parent.runover),
            lines_before: self.lines_before.unwrap_or(parent.lines_before),
            lines_after: self.lines_after.unwrap_or(parent.lines_after),
            align: self.align.unwrap_or(parent.align),
            new_pages_before: self.new_pages_before.unwrap_or(parent.new_pages_before),
            new_pages_after: self.new_pages_after.unwrap_or(parent.new_pages_after),
            keep_with_next: self.keep_with_next.unwrap_or(parent.keep_with_next),
            skip_number_lines: self.skip_number_lines.unwrap_or(parent.skip_number_lines),
            centered_with_dots: self.centered_with_dots.unwrap_or(parent.centered_with_dots),
            line_spacing: self.line_spacing.unwrap_or(parent.line_spacing),
            format: self.format.unwrap_or(parent.format),
        }
    }

    /// Set one field from a dynamic `opt-<field>` attribute.
    pub fn set_option(&mut self, field: &str, value: &str) -> std::result::Result<(), String> {
        fn num(value: &str) -> std::result::Result<usize, String> {
            value
                .trim()
                .parse()
                .map_err(|_| format!("\"{}\" is not a number", value))
        }
        fn flag(value: &str) -> std::result::Result<bool, String> {
            match value.trim() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                other => Err(format!("\"{}\" is not a boolean", other)),
            }
        }
        match field {
            "indent" => self.indent = Some(num(value)?),
            "runover" => self.runover = Some(num(value)?),
            "linesBefore" => self.lines_before = Some(num(value)?),
            "linesAfter" => self.lines_after = Some(num(value)?),
            "newPagesBefore" => self.new_pages_before = Some(num(value)?),
            "newPagesAfter" => self.new_pages_after = Some(num(value)?),
            "lineSpacing" => self.line_spacing = Some(num(value)?),
            "keepWithNext" => self.keep_with_next = Some(flag(value)?),
            "skipNumberLines" => self.skip_number_lines = Some(flag(value)?),
            "centeredWithDots" => self.centered_with_dots = Some(flag(value)?),
            "align" => {
                self.align = Some(match value.trim() {
                    "left" => Align::Left,
                    "center" | "centered" => Align::Center,
                    "right" => Align::Right,
                    other => return Err(format!("unknown alignment \"{}\"", other)),
                })
            }
            "format" => {
                self.format = Some(match value.trim() {
                    "normal" => FormatKind::Normal,
                    "table" => FormatKind::Table,
                    "toc" => FormatKind::Toc,
                    "skip" => FormatKind::Skip,
                    other => return Err(format!("unknown format \"{}\"", other)),
                })
            }
            other => return Err(format!("unknown style option \"{}\"", other)),
        }
        Ok(())
    }
}

/// Resolved named styles.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    styles: BTreeMap<String, Arc<Style>>,
}

impl StyleSheet {
    /// Resolve every definition against its base chain.
    ///
    /// Unknown bases and inheritance cycles are configuration errors.
    pub fn from_defs(defs: &BTreeMap<String, StyleDef>) -> Result<Self> {
        let mut styles: BTreeMap<String, Arc<Style>> = BTreeMap::new();
        let root = match defs.get(DEFAULT_STYLE) {
            Some(def) => {
                if let Some(base) = &def.base {
                    return Err(Error::Config(format!(
                        "style {} cannot inherit from \"{}\"",
                        DEFAULT_STYLE, base
                    )));
                }
                def.apply(DEFAULT_STYLE, &Style::root())
            }
            None => Style::root(),
        };
        let mut root = root;
        root.base = None;
        styles.insert(DEFAULT_STYLE.to_string(), Arc::new(root));

        for name in defs.keys() {
            let mut visiting = HashSet::new();
            resolve_def(name, defs, &mut styles, &mut visiting)?;
        }
        log::debug!("Resolved {} styles", styles.len());
        Ok(Self { styles })
    }

    /// Look up a style by name.
    pub fn get(&self, name: &str) -> Option<Arc<Style>> {
        self.styles.get(name).cloned()
    }

    /// The root style.
    pub fn default_style(&self) -> Arc<Style> {
        self.styles
            .get(DEFAULT_STYLE)
            .cloned()
            .unwrap_or_else(|| Arc::new(Style::root()))
    }

    /// Whether a style exists.
    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    /// Style names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(|s| s.as_str())
    }

    /// Number of styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether only the root style exists.
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }
}

fn resolve_def(
    name: &str,
    defs: &BTreeMap<String, StyleDef>,
    styles: &mut BTreeMap<String, Arc<Style>>,
    visiting: &mut HashSet<String>,
) -> Result<Arc<Style>> {
    if let Some(style) = styles.get(name) {
        return Ok(style.clone());
    }
    let def = defs
        .get(name)
        .ok_or_else(|| Error::Config(format!("unknown base style \"{}\"", name)))?;
    if !visiting.insert(name.to_string()) {
        return Err(Error::Config(format!(
            "style inheritance cycle through \"{}\"",
            name
        )));
    }
    let base = def.base.as_deref().unwrap_or(DEFAULT_STYLE);
    let parent = resolve_def(base, defs, styles, visiting)?;
    let style = Arc::new(def.apply(name, &parent));
    styles.insert(name.to_string(), style.clone());
    Ok(style)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(list: &[(&str, StyleDef)]) -> BTreeMap<String, StyleDef> {
        list.iter()
            .map(|(n, d)| (n.to_string(), d.clone()))
            .collect()
    }

    #[test]
    fn test_inheritance() {
        let sheet = StyleSheet::from_defs(&defs(&[
            ("para", StyleDef::default().with_indent(2, 0).with_lines(1, 0)),
            ("quote", StyleDef::based_on("para").with_indent(4, 4)),
        ]))
        .unwrap();

        let quote = sheet.get("quote").unwrap();
        assert_eq!(quote.indent, 4);
        assert_eq!(quote.lines_before, 1);
        assert_eq!(quote.base.as_deref(), Some("para"));
        assert_eq!(sheet.get("para").unwrap().base.as_deref(), Some(DEFAULT_STYLE));
        assert!(sheet.contains(DEFAULT_STYLE));
    }

    #[test]
    fn test_unknown_base() {
        let err = StyleSheet::from_defs(&defs(&[("a", StyleDef::based_on("missing"))])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_cycle() {
        let err = StyleSheet::from_defs(&defs(&[
            ("a", StyleDef::based_on("b")),
            ("b", StyleDef::based_on("a")),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_set_option() {
        let mut def = StyleDef::default();
        def.set_option("linesBefore", "2").unwrap();
        def.set_option("align", "center").unwrap();
        def.set_option("keepWithNext", "true").unwrap();
        assert_eq!(def.lines_before, Some(2));
        assert_eq!(def.align, Some(Align::Center));
        assert_eq!(def.keep_with_next, Some(true));
        assert!(def.set_option("linesBefore", "two").is_err());
        assert!(def.set_option("colour", "red").is_err());
    }

    #[test]
    fn test_style_def_json() {
        let def: StyleDef =
            serde_json::from_str(r#"{"base":"para","linesBefore":1,"align":"center"}"#).unwrap();
        assert_eq!(def.base.as_deref(), Some("para"));
        assert_eq!(def.align, Some(Align::Center));
        assert!(serde_json::from_str::<StyleDef>(r#"{"bogus":1}"#).is_err());
    }
}
