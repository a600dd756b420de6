//! Engine configuration.
//!
//! Four JSON files describe an engine: `page.json`, `braille.json`,
//! `styles.json` and `rules.json`. They are read from explicit paths or from
//! `<root>/settings/`. [`EngineConfig::default`] is a complete built-in
//! configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::render::{Encoding, LineEnding};
use crate::style::{
    Action, Align, FormatKind, ListRule, MarginRule, Matcher, RuleSet, StyleDef, DEFAULT_STYLE,
};
use crate::translate::{MathCode, UEB_GRADE1};

/// Smallest usable page.
const MIN_CELLS: usize = 10;
const MIN_LINES: usize = 3;

/// Braille cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellType {
    #[default]
    Standard,
    Jumbo,
}

impl CellType {
    /// Cell-to-cell and line-to-line distance in millimetres.
    pub fn spacing_mm(&self) -> (f64, f64) {
        match self {
            CellType::Standard => (6.2, 10.0),
            CellType::Jumbo => (7.5, 11.0),
        }
    }
}

/// Paper and margins. When present, the page size in cells is derived
/// from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaperGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub margin_right_mm: f64,
    pub cell: CellType,
}

impl Default for PaperGeometry {
    fn default() -> Self {
        // 11.5 x 11 inch braille paper
        Self {
            width_mm: 292.1,
            height_mm: 279.4,
            margin_top_mm: 12.7,
            margin_bottom_mm: 12.7,
            margin_left_mm: 25.4,
            margin_right_mm: 12.7,
            cell: CellType::Standard,
        }
    }
}

impl PaperGeometry {
    /// Cells per line and lines per page that fit inside the margins.
    pub fn cells(&self) -> (usize, usize) {
        let (cell_w, line_h) = self.cell.spacing_mm();
        let usable_w = self.width_mm - self.margin_left_mm - self.margin_right_mm;
        let usable_h = self.height_mm - self.margin_top_mm - self.margin_bottom_mm;
        let fit = |len: f64, step: f64| if len > 0.0 { (len / step).floor() as usize } else { 0 };
        (fit(usable_w, cell_w), fit(usable_h, line_h))
    }
}

/// Page layout settings (`page.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSettings {
    pub cells_per_line: usize,
    pub lines_per_page: usize,
    /// Duplex output: even pages are versos
    pub interpoint: bool,
    /// Braille page number at the bottom right
    pub braille_page_numbers: bool,
    /// Print page number at the top right
    pub print_page_numbers: bool,
    /// Number verso pages too when interpoint
    pub number_verso_pages: bool,
    /// Print text of the running head
    pub running_head: Option<String>,
    /// Use the document title as running head
    pub running_head_from_title: bool,
    pub paper: Option<PaperGeometry>,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            cells_per_line: 40,
            lines_per_page: 25,
            interpoint: false,
            braille_page_numbers: true,
            print_page_numbers: true,
            number_verso_pages: false,
            running_head: None,
            running_head_from_title: false,
            paper: None,
        }
    }
}

impl PageSettings {
    /// Create settings for a page of `cells` x `lines`.
    pub fn new(cells: usize, lines: usize) -> Self {
        Self {
            cells_per_line: cells,
            lines_per_page: lines,
            ..Default::default()
        }
    }

    pub fn with_interpoint(mut self, interpoint: bool) -> Self {
        self.interpoint = interpoint;
        self
    }

    pub fn with_page_numbers(mut self, braille: bool, print: bool) -> Self {
        self.braille_page_numbers = braille;
        self.print_page_numbers = print;
        self
    }

    pub fn with_running_head(mut self, head: impl Into<String>) -> Self {
        self.running_head = Some(head.into());
        self
    }

    /// Page width in cells.
    pub fn width(&self) -> usize {
        match &self.paper {
            Some(paper) => paper.cells().0,
            None => self.cells_per_line,
        }
    }

    /// Page height in lines.
    pub fn height(&self) -> usize {
        match &self.paper {
            Some(paper) => paper.cells().1,
            None => self.lines_per_page,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.width() < MIN_CELLS || self.height() < MIN_LINES {
            return Err(Error::Config(format!(
                "page of {}x{} cells is too small (minimum {}x{})",
                self.width(),
                self.height(),
                MIN_CELLS,
                MIN_LINES
            )));
        }
        Ok(())
    }
}

/// Translation settings (`braille.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrailleSettings {
    pub encoding: Encoding,
    /// Braille table id
    pub table: String,
    pub math_code: MathCode,
    pub line_ending: LineEnding,
    /// Attempts at measuring a table before giving up
    pub probe_attempts: u32,
    /// Write ASCII braille in upper case
    pub uppercase: bool,
}

impl Default for BrailleSettings {
    fn default() -> Self {
        Self {
            encoding: Encoding::Ascii,
            table: UEB_GRADE1.to_string(),
            math_code: MathCode::Nemeth,
            line_ending: LineEnding::Crlf,
            probe_attempts: 3,
            uppercase: true,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub page: PageSettings,
    pub braille: BrailleSettings,
    pub styles: BTreeMap<String, StyleDef>,
    pub rules: RuleSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page: PageSettings::default(),
            braille: BrailleSettings::default(),
            styles: builtin_styles(),
            rules: builtin_rules(),
        }
    }
}

impl EngineConfig {
    /// Load from `<root>/settings/{page,braille,styles,rules}.json`.
    pub fn load_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let settings = root.as_ref().join("settings");
        if !settings.is_dir() {
            return Err(Error::Config(format!(
                "settings directory {} not found",
                settings.display()
            )));
        }
        Self::from_paths(
            settings.join("page.json"),
            settings.join("braille.json"),
            settings.join("styles.json"),
            settings.join("rules.json"),
        )
    }

    /// Load from explicit file paths.
    pub fn from_paths<P: AsRef<Path>>(page: P, braille: P, styles: P, rules: P) -> Result<Self> {
        let config = Self {
            page: read_json(page.as_ref())?,
            braille: read_json(braille.as_ref())?,
            styles: read_json(styles.as_ref())?,
            rules: read_json(rules.as_ref())?,
        };
        config.validate()?;
        log::debug!(
            "Loaded configuration: {} styles, {} style rules, table {}",
            config.styles.len(),
            config.rules.styles.len(),
            config.braille.table
        );
        Ok(config)
    }

    /// Write the configuration as the four files under `<root>/settings/`.
    pub fn save_dir<P: AsRef<Path>>(&self, root: P) -> Result<PathBuf> {
        let settings = root.as_ref().join("settings");
        fs::create_dir_all(&settings)?;
        fs::write(settings.join("page.json"), serde_json::to_string_pretty(&self.page)?)?;
        fs::write(settings.join("braille.json"), serde_json::to_string_pretty(&self.braille)?)?;
        fs::write(settings.join("styles.json"), serde_json::to_string_pretty(&self.styles)?)?;
        fs::write(settings.join("rules.json"), serde_json::to_string_pretty(&self.rules)?)?;
        Ok(settings)
    }

    /// Check settings that can be checked without building an engine.
    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        if self.braille.probe_attempts == 0 {
            return Err(Error::Config("probeAttempts must be at least 1".to_string()));
        }
        if self.braille.table.is_empty() {
            return Err(Error::Config("no braille table configured".to_string()));
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("malformed {}: {}", path.display(), e)))
}

/// Styles of the built-in configuration.
pub fn builtin_styles() -> BTreeMap<String, StyleDef> {
    let mut styles = BTreeMap::new();
    styles.insert(DEFAULT_STYLE.to_string(), StyleDef::default());
    styles.insert(
        "paragraph".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_indent(2, 0),
    );
    styles.insert(
        "heading1".to_string(),
        StyleDef::based_on(DEFAULT_STYLE)
            .with_align(Align::Center)
            .with_lines(1, 1)
            .with_keep_with_next(true)
            .with_skip_number_lines(true),
    );
    styles.insert(
        "heading2".to_string(),
        StyleDef::based_on(DEFAULT_STYLE)
            .with_indent(4, 4)
            .with_lines(1, 0)
            .with_keep_with_next(true),
    );
    styles.insert("listItem".to_string(), StyleDef::based_on(DEFAULT_STYLE));
    styles.insert("margin".to_string(), StyleDef::based_on(DEFAULT_STYLE));
    styles.insert(
        "table".to_string(),
        StyleDef::based_on(DEFAULT_STYLE)
            .with_indent(0, 2)
            .with_lines(1, 1)
            .with_format(FormatKind::Table),
    );
    styles.insert("tableCell".to_string(), StyleDef::based_on(DEFAULT_STYLE));
    styles.insert(
        "toc".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_format(FormatKind::Toc),
    );
    styles.insert(
        "tocEntry".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_indent(0, 2),
    );
    styles.insert(
        "tocHeading".to_string(),
        StyleDef::based_on(DEFAULT_STYLE)
            .with_align(Align::Center)
            .with_lines(1, 1),
    );
    styles.insert(
        "skip".to_string(),
        StyleDef::based_on(DEFAULT_STYLE).with_format(FormatKind::Skip),
    );
    styles
}

/// Rules of the built-in configuration.
pub fn builtin_rules() -> RuleSet {
    let mut rules = RuleSet::new()
        .with_style(
            Matcher::typed("block", "heading").and(Matcher::attr("level", "2")),
            "heading2",
        )
        .with_style(Matcher::typed("block", "heading"), "heading1")
        .with_style(Matcher::typed("block", "paragraph"), "paragraph")
        .with_style(
            Matcher::name("block").and(Matcher::Not {
                matcher: Box::new(Matcher::has_attr("type")),
            }),
            "paragraph",
        )
        .with_style(Matcher::typed("container", "table"), "table")
        .with_style(Matcher::typed("block", "tableCell"), "tableCell")
        .with_style(Matcher::typed("container", "toc"), "toc")
        .with_style(Matcher::typed("block", "tocEntry"), "tocEntry")
        .with_style(Matcher::typed("block", "tocHeading"), "tocHeading")
        .with_action(Matcher::typed("inline", "emphasis"), Action::Emphasis(Default::default()))
        .with_action(Matcher::typed("inline", "noTranslate"), Action::NoTranslate)
        .with_action(Matcher::name("mfrac"), Action::math("(", ")/(", ")"))
        .with_action(Matcher::name("msup"), Action::math("", "^", ""))
        .with_action(Matcher::name("msub"), Action::math("", "_", ""))
        .with_action(Matcher::name("msqrt"), Action::math("sqrt(", "", ")"))
        .with_action(
            Matcher::typed("container", "image"),
            Action::Attribute {
                name: "alt".to_string(),
                pre: String::new(),
                post: String::new(),
            },
        );
    rules.lists.push(ListRule {
        list_type: "*".to_string(),
        prefix: "L".to_string(),
        base: "listItem".to_string(),
    });
    rules.margins.push(MarginRule {
        margin_type: "*".to_string(),
        prefix: String::new(),
        base: "margin".to_string(),
    });
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleSheet;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        let sheet = StyleSheet::from_defs(&config.styles).unwrap();
        assert!(sheet.get("heading1").unwrap().keep_with_next);
        assert_eq!(sheet.get("paragraph").unwrap().indent, 2);
    }

    #[test]
    fn test_paper_geometry() {
        let page = PageSettings {
            paper: Some(PaperGeometry::default()),
            ..Default::default()
        };
        assert_eq!(page.width(), 40);
        assert_eq!(page.height(), 25);
    }

    #[test]
    fn test_page_too_small() {
        let config = EngineConfig {
            page: PageSettings::new(4, 25),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_settings_from_partial_json() {
        let page: PageSettings = serde_json::from_str(r#"{"cellsPerLine": 32}"#).unwrap();
        assert_eq!(page.cells_per_line, 32);
        assert_eq!(page.lines_per_page, 25);
        let braille: BrailleSettings =
            serde_json::from_str(r#"{"encoding": "unicode", "mathCode": "uebTechnical"}"#).unwrap();
        assert_eq!(braille.encoding, Encoding::Unicode);
        assert_eq!(braille.math_code, MathCode::UebTechnical);
        assert_eq!(braille.probe_attempts, 3);
    }
}
