//! Long-lived engine tying translation, layout and output together.
//!
//! An [`Engine`] is built once from an [`EngineConfig`]: the style sheet
//! and rule set are compiled and the braille table is looked up at
//! construction, so configuration mistakes surface before any document is
//! touched. Documents are then processed in three stages:
//!
//! 1. [`Engine::translate`] attaches braille to the document,
//! 2. [`Engine::format`] lays the braille out on pages,
//! 3. [`Engine::to_brf`] serializes the pages.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::format::{BraillePage, FormatEngine};
use crate::model::Document;
use crate::render::{self, BrfOptions};
use crate::style::{RuleSet, StyleResolver, StyleSheet};
use crate::translate::{BrailleTable, TableProbe, TableRegistry, Translator};

/// Braille translation and pagination engine.
pub struct Engine {
    config: EngineConfig,
    resolver: StyleResolver,
    tables: TableRegistry,
    document_rules: Option<RuleSet>,
}

impl Engine {
    /// Build an engine from a configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let sheet = StyleSheet::from_defs(&config.styles)?;
        let resolver = StyleResolver::new(sheet, config.rules.clone())?;
        let tables = TableRegistry::new();
        if !tables.contains(&config.braille.table) {
            return Err(Error::Config(format!(
                "unknown braille table '{}' (available: {})",
                config.braille.table,
                tables.ids().join(", ")
            )));
        }
        log::debug!(
            "Engine ready: {} styles, table {}, {}x{} cells",
            resolver.sheet().len(),
            config.braille.table,
            config.page.width(),
            config.page.height()
        );
        Ok(Self {
            config,
            resolver,
            tables,
            document_rules: None,
        })
    }

    /// Register an additional braille table.
    ///
    /// A table registered under the configured id replaces the built-in one.
    pub fn with_table(mut self, table: Arc<dyn BrailleTable>) -> Self {
        self.tables.register(table);
        self
    }

    /// Rules supplied with the documents processed by this engine.
    pub fn with_document_rules(mut self, rules: RuleSet) -> Self {
        self.document_rules = Some(rules);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    fn translator(&self) -> Result<Translator<'_>> {
        let table = self.tables.get(&self.config.braille.table)?;
        Ok(
            Translator::new(&self.resolver, table, self.config.braille.math_code)?
                .with_document_rules(self.document_rules.as_ref()),
        )
    }

    /// Translate a document in place.
    ///
    /// Earlier translation output is stripped first, tables are probed for
    /// their layout and every span gets its `Brl` node. Returns the number
    /// of `Brl` nodes attached.
    pub fn translate(&self, doc: &mut Document) -> Result<usize> {
        doc.strip_formatting();
        let translator = self.translator()?;

        let probed = TableProbe::new(&translator, self.config.page.width())
            .with_attempts(self.config.braille.probe_attempts)
            .probe_document(doc)?;
        if probed > 0 {
            log::debug!("Probed {} tables", probed);
        }

        translator.translate_document(doc)
    }

    /// Braille text of the running head, if one is configured.
    pub fn running_head(&self, doc: &Document) -> Result<Option<String>> {
        let page = &self.config.page;
        let text = match (&page.running_head, page.running_head_from_title) {
            (Some(head), _) => Some(head.as_str()),
            (None, true) => doc.metadata.title.as_deref(),
            (None, false) => None,
        };
        match text {
            Some(text) if !text.trim().is_empty() => {
                Ok(Some(self.translator()?.translate_text(text)?))
            }
            _ => Ok(None),
        }
    }

    /// Lay out a translated document on braille pages.
    pub fn format(&self, doc: &Document) -> Result<Vec<BraillePage>> {
        let head = self.running_head(doc)?;
        let pages = FormatEngine::new(doc, &self.resolver, &self.config.page)
            .with_document_rules(self.document_rules.as_ref())
            .with_running_head(head)
            .format()?;
        log::debug!("Formatted {} pages", pages.len());
        Ok(pages)
    }

    /// BRF options derived from the configuration.
    pub fn brf_options(&self) -> BrfOptions {
        let braille = &self.config.braille;
        BrfOptions::new()
            .with_encoding(braille.encoding)
            .with_line_ending(braille.line_ending)
            .with_uppercase(braille.uppercase)
            .with_interpoint(self.config.page.interpoint)
    }

    /// Serialize pages as BRF.
    pub fn to_brf(&self, pages: &[BraillePage]) -> Result<Vec<u8>> {
        render::to_brf(pages, &self.brf_options())
    }

    /// Translate, format and serialize a document.
    pub fn process(&self, doc: &mut Document) -> Result<Vec<u8>> {
        self.translate(doc)?;
        let pages = self.format(doc)?;
        self.to_brf(&pages)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("table", &self.config.braille.table)
            .field("tables", &self.tables)
            .field("document_rules", &self.document_rules.is_some())
            .finish()
    }
}
