//! Choosing between simple and linear table layout.
//!
//! A table is probed by translating a copy of it on its own and measuring
//! the braille width of its columns. The chosen type is recorded on the
//! table as `brl:tableType`.

use super::translator::Translator;
use crate::error::{Error, Result};
use crate::format::{TableMetrics, TableType, TABLE_TYPE_ATTR, USER_TABLE_TYPE_ATTR};
use crate::model::{ContainerType, Document, ElementKind, NodeId};

/// Default number of translation attempts per table.
pub const DEFAULT_PROBE_ATTEMPTS: u32 = 3;

/// Measures tables with a translator.
pub struct TableProbe<'t, 'a> {
    translator: &'t Translator<'a>,
    width: usize,
    attempts: u32,
}

impl<'t, 'a> TableProbe<'t, 'a> {
    /// Probe for a line of `width` cells.
    pub fn new(translator: &'t Translator<'a>, width: usize) -> Self {
        Self {
            translator,
            width,
            attempts: DEFAULT_PROBE_ATTEMPTS,
        }
    }

    /// Attempts before giving up on an interrupted translation.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Translate a copy of `table` and measure it.
    pub fn measure(&self, doc: &Document, table: NodeId) -> Result<TableMetrics> {
        let mut copy = doc.clone_subtree(table);
        copy.strip_formatting();
        self.translator.translate_document(&mut copy)?;
        Ok(TableMetrics::measure(&copy, copy.root()))
    }

    /// Decide the layout of one table, retrying interrupted translations.
    pub fn probe(&self, doc: &Document, table: NodeId) -> Result<TableType> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.measure(doc, table) {
                Ok(metrics) => {
                    let table_type = metrics.table_type(self.width);
                    log::debug!(
                        "Table probe: {} cells needed, {} available, {}",
                        metrics.simple_width(2),
                        self.width,
                        table_type.as_str()
                    );
                    return Ok(table_type);
                }
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    log::warn!("Table probe interrupted (attempt {}/{}), retrying", attempt, self.attempts);
                }
                Err(e) if e.is_transient() => {
                    return Err(Error::ProbeFailed {
                        attempts: self.attempts,
                        node: doc.snippet(table),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Probe every table of a document that does not force a type, and
    /// record the result. Returns the number of tables probed.
    pub fn probe_document(&self, doc: &mut Document) -> Result<usize> {
        let tables: Vec<NodeId> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|id| {
                doc.element(*id).map(|e| e.kind())
                    == Some(ElementKind::Container(ContainerType::Table))
                    && doc.attr(*id, USER_TABLE_TYPE_ATTR).is_none()
            })
            .collect();
        for table in &tables {
            let table_type = self.probe(doc, *table)?;
            doc.set_attr(*table, TABLE_TYPE_ATTR, table_type.as_str());
        }
        Ok(tables.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_rules, builtin_styles};
    use crate::parser::XmlParser;
    use crate::style::{StyleResolver, StyleSheet};
    use crate::translate::table::{BrailleTable, TableOutput, UebGrade1};
    use crate::translate::MathCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails with `Interrupted` a fixed number of times, then translates.
    struct Flaky {
        failures: AtomicUsize,
    }

    impl BrailleTable for Flaky {
        fn id(&self) -> &str {
            "flaky"
        }

        fn translate(&self, input: &str) -> Result<TableOutput> {
            let failed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(Error::Interrupted);
            }
            UebGrade1.translate(input)
        }
    }

    fn resolver() -> StyleResolver {
        let sheet = StyleSheet::from_defs(&builtin_styles()).unwrap();
        StyleResolver::new(sheet, builtin_rules()).unwrap()
    }

    const TABLE: &str = r#"<document><container type="table">
        <container type="tableRow"><block type="tableCell">apple</block><block type="tableCell">red</block></container>
        <container type="tableRow"><block type="tableCell">banana</block><block type="tableCell">yellow</block></container>
    </container></document>"#;

    fn parse(xml: &str) -> Document {
        XmlParser::from_str_with_options(xml, Default::default())
            .parse()
            .unwrap()
    }

    #[test]
    fn test_probe_records_type() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(UebGrade1), MathCode::Nemeth).unwrap();
        let mut doc = parse(TABLE);
        assert_eq!(TableProbe::new(&translator, 40).probe_document(&mut doc).unwrap(), 1);
        let table = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.attr(table, TABLE_TYPE_ATTR), Some("simple"));
        // The document itself is not translated by probing
        assert_eq!(doc.braille_content(doc.root()), "");

        TableProbe::new(&translator, 10).probe_document(&mut doc).unwrap();
        assert_eq!(doc.attr(table, TABLE_TYPE_ATTR), Some("linear"));
    }

    #[test]
    fn test_probe_retries_interrupted() {
        let resolver = resolver();
        let flaky = Arc::new(Flaky {
            failures: AtomicUsize::new(2),
        });
        let translator = Translator::new(&resolver, flaky, MathCode::Nemeth).unwrap();
        let doc = parse(TABLE);
        let table = doc.first_child(doc.root()).unwrap();
        let probe = TableProbe::new(&translator, 40).with_attempts(3);
        assert_eq!(probe.probe(&doc, table).unwrap(), TableType::Simple);
    }

    #[test]
    fn test_probe_gives_up() {
        let resolver = resolver();
        let flaky = Arc::new(Flaky {
            failures: AtomicUsize::new(100),
        });
        let translator = Translator::new(&resolver, flaky, MathCode::Nemeth).unwrap();
        let doc = parse(TABLE);
        let table = doc.first_child(doc.root()).unwrap();
        let err = TableProbe::new(&translator, 40).probe(&doc, table).unwrap_err();
        assert!(matches!(err, Error::ProbeFailed { attempts: 3, .. }));
        assert!(!err.is_transient());
    }
}
