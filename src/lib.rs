//! # brlpage
//!
//! Braille translation and pagination engine for Rust.
//!
//! This library reads a semantically tagged XML document, translates its
//! text to braille and lays the braille out on fixed-size pages, producing
//! a BRF (braille ready file).
//!
//! ## Quick Start
//!
//! ```no_run
//! use brlpage::{parse_file, Engine, EngineConfig};
//!
//! fn main() -> brlpage::Result<()> {
//!     // Parse a tagged document
//!     let mut doc = parse_file("book.xml")?;
//!
//!     // Translate, paginate and serialize
//!     let engine = Engine::new(EngineConfig::default())?;
//!     let brf = engine.process(&mut doc)?;
//!     std::fs::write("book.brf", brf)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Rule-driven styles**: ordered matcher rules bind styles and actions to nodes
//! - **Pluggable tables**: uncontracted UEB and computer braille built in
//! - **Emphasis and math**: UEB typeform indicators, Nemeth and UEB technical math
//! - **Pagination**: running heads, print and braille page numbers, keep-with-next
//! - **Tables and contents**: simple/linear table layout, guide-dot TOC entries
//! - **Parallel translation**: uses Rayon for independent blocks

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod parser;
pub mod render;
pub mod style;
pub mod translate;

// Re-export commonly used types
pub use config::{BrailleSettings, EngineConfig, PageSettings};
pub use engine::Engine;
pub use error::{Error, Result};
pub use format::{BraillePage, PageGrid, PageNumberType};
pub use model::{Document, NodeId};
pub use parser::{ErrorMode, ParseOptions, XmlParser};
pub use render::{BrfOptions, Encoding, FormatStats, JsonFormat, LineEnding};
pub use style::{Action, RuleSet, Style, StyleResolver, StyleSheet};
pub use translate::{BrailleTable, MathCode, TableRegistry, Translator};

use std::path::Path;

/// Parse a tagged XML file into a document.
///
/// # Example
///
/// ```no_run
/// use brlpage::parse_file;
///
/// let doc = parse_file("book.xml").unwrap();
/// println!("Title: {:?}", doc.metadata.title);
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    XmlParser::open(path)?.parse()
}

/// Parse a tagged XML file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    XmlParser::open_with_options(path, options)?.parse()
}

/// Parse tagged XML from a string.
///
/// # Example
///
/// ```
/// use brlpage::parse_str;
///
/// let doc = parse_str("<document><section/></document>").unwrap();
/// assert!(doc.metadata.title.is_none());
/// ```
pub fn parse_str(xml: &str) -> Result<Document> {
    XmlParser::from_str_with_options(xml, ParseOptions::default()).parse()
}

/// Convert an XML file to BRF with the built-in configuration.
///
/// # Example
///
/// ```no_run
/// use brlpage::to_brf_file;
///
/// let brf = to_brf_file("book.xml").unwrap();
/// std::fs::write("book.brf", brf).unwrap();
/// ```
pub fn to_brf_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let mut doc = parse_file(path)?;
    Engine::new(EngineConfig::default())?.process(&mut doc)
}

/// Builder for translating and paginating documents.
///
/// # Example
///
/// ```no_run
/// use brlpage::Brlpage;
///
/// let brf = Brlpage::new()
///     .with_page_size(32, 25)
///     .with_interpoint(true)
///     .lenient()
///     .convert("book.xml")?
///     .to_brf()?;
/// # Ok::<(), brlpage::Error>(())
/// ```
pub struct Brlpage {
    parse_options: ParseOptions,
    config: EngineConfig,
}

impl Brlpage {
    /// Create a builder with the built-in configuration.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            config: EngineConfig::default(),
        }
    }

    /// Start from a complete configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable lenient parsing mode.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Set the page size in cells and lines.
    pub fn with_page_size(mut self, cells: usize, lines: usize) -> Self {
        self.config.page.cells_per_line = cells;
        self.config.page.lines_per_page = lines;
        self.config.page.paper = None;
        self
    }

    /// Enable interpoint output.
    pub fn with_interpoint(mut self, interpoint: bool) -> Self {
        self.config.page = self.config.page.with_interpoint(interpoint);
        self
    }

    /// Set the running head text.
    pub fn with_running_head(mut self, head: impl Into<String>) -> Self {
        self.config.page = self.config.page.with_running_head(head);
        self
    }

    /// Set the braille table id.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.config.braille.table = table.into();
        self
    }

    /// Set the braille math code.
    pub fn with_math_code(mut self, code: MathCode) -> Self {
        self.config.braille.math_code = code;
        self
    }

    /// Set the output character set.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.config.braille.encoding = encoding;
        self
    }

    /// Parse, translate and paginate an XML file.
    pub fn convert<P: AsRef<Path>>(self, path: P) -> Result<BrlpageResult> {
        let document = XmlParser::open_with_options(path, self.parse_options.clone())?.parse()?;
        self.convert_document(document)
    }

    /// Parse, translate and paginate XML from a string.
    pub fn convert_str(self, xml: &str) -> Result<BrlpageResult> {
        let document = XmlParser::from_str_with_options(xml, self.parse_options.clone()).parse()?;
        self.convert_document(document)
    }

    /// Translate and paginate a parsed document.
    pub fn convert_document(self, mut document: Document) -> Result<BrlpageResult> {
        let engine = Engine::new(self.config)?;
        engine.translate(&mut document)?;
        let pages = engine.format(&document)?;
        let stats = FormatStats::from_pages(&pages);
        Ok(BrlpageResult {
            document,
            pages,
            stats,
            brf_options: engine.brf_options(),
        })
    }
}

impl Default for Brlpage {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of converting a document.
pub struct BrlpageResult {
    /// The translated document
    pub document: Document,
    /// Formatted pages
    pub pages: Vec<BraillePage>,
    /// Page statistics
    pub stats: FormatStats,
    brf_options: BrfOptions,
}

impl BrlpageResult {
    /// Serialize as BRF.
    pub fn to_brf(&self) -> Result<Vec<u8>> {
        render::to_brf(&self.pages, &self.brf_options)
    }

    /// Serialize as a BRF string.
    pub fn to_brf_string(&self) -> Result<String> {
        render::to_brf_string(&self.pages, &self.brf_options)
    }

    /// Dump pages as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.pages, format, false)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
