//! Span collection, table translation and attachment of `Brl` nodes.

use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::emphasis::apply_typeform;
use super::math::{MathCode, MathNode};
use super::normalize::{NormalizeOptions, Normalizer};
use super::span::{Attach, ContentType, TextSpan};
use super::table::{ascii_to_unicode, BrailleTable};
use crate::error::{Error, Result};
use crate::model::{BrlData, Document, ElementKind, EmphasisSet, InlineType, NodeData, NodeId};
use crate::style::{Action, RuleSet, StyleResolver};

/// Braille text with the source offset of every character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub braille: String,
    pub index: Vec<u32>,
}

impl Translation {
    fn push(&mut self, c: char, source: u32) {
        self.braille.push(c);
        self.index.push(source);
    }
}

/// Turns the text of a document into attached braille.
pub struct Translator<'a> {
    resolver: &'a StyleResolver,
    table: Arc<dyn BrailleTable>,
    math_code: MathCode,
    normalizer: Normalizer,
    doc_rules: Option<&'a RuleSet>,
}

impl<'a> Translator<'a> {
    /// Create a translator using `table` for print text and `math_code`
    /// for math elements.
    pub fn new(
        resolver: &'a StyleResolver,
        table: Arc<dyn BrailleTable>,
        math_code: MathCode,
    ) -> Result<Self> {
        Ok(Self {
            resolver,
            table,
            math_code,
            normalizer: Normalizer::new(NormalizeOptions::default())?,
            doc_rules: None,
        })
    }

    /// Set text normalization options.
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Result<Self> {
        self.normalizer = Normalizer::new(options)?;
        Ok(self)
    }

    /// Rules supplied with the document, consulted before the base rules.
    pub fn with_document_rules(mut self, rules: Option<&'a RuleSet>) -> Self {
        self.doc_rules = rules;
        self
    }

    pub fn table_id(&self) -> &str {
        self.table.id()
    }

    /// Translate the whole document, attaching one `Brl` node per span.
    ///
    /// Returns the number of `Brl` nodes attached.
    pub fn translate_document(&self, doc: &mut Document) -> Result<usize> {
        let units = self.translation_units(doc);
        log::debug!("Translating {} units with {}", units.len(), self.table.id());

        let shared: &Document = doc;
        #[cfg(feature = "parallel")]
        let results: Vec<Vec<(TextSpan, Translation)>> = units
            .par_iter()
            .map(|unit| self.translate_unit(shared, *unit))
            .collect::<Result<_>>()?;
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Vec<(TextSpan, Translation)>> = units
            .iter()
            .map(|unit| self.translate_unit(shared, *unit))
            .collect::<Result<_>>()?;

        let mut attached = 0;
        for (span, translation) in results.into_iter().flatten() {
            if self.attach(doc, &span, translation)? {
                attached += 1;
            }
        }
        Ok(attached)
    }

    /// Elements whose text is translated as one run: every block, plus
    /// elements holding loose text outside any block.
    pub fn translation_units(&self, doc: &Document) -> Vec<NodeId> {
        let mut units = Vec::new();
        self.collect_units(doc, doc.root(), false, &mut units);
        units
    }

    fn collect_units(&self, doc: &Document, node: NodeId, inside: bool, units: &mut Vec<NodeId>) {
        let Some(element) = doc.element(node) else {
            return;
        };
        if matches!(element.kind(), ElementKind::PageIndicator) {
            return;
        }
        if self.resolver.action(doc, node, self.doc_rules).is_skip() {
            return;
        }
        let loose_text = doc
            .children(node)
            .any(|c| doc.text(c).map(|t| !t.trim().is_empty()).unwrap_or(false));
        let attribute = matches!(
            self.resolver.action(doc, node, self.doc_rules),
            Action::Attribute { .. }
        );
        let is_unit = element.is_block() || (!inside && (loose_text || attribute));
        if is_unit {
            units.push(node);
        }
        // Math is translated as a whole by its unit
        if matches!(element.kind(), ElementKind::Inline(InlineType::Math)) {
            return;
        }
        for child in doc.children(node) {
            self.collect_units(doc, child, inside || is_unit, units);
        }
    }

    /// Spans of a unit in document order. Nested blocks are skipped; they
    /// are units of their own.
    pub fn collect_spans(&self, doc: &Document, unit: NodeId) -> Vec<TextSpan> {
        let mut spans = Vec::new();
        if doc.element(unit).map(|e| e.kind()) == Some(ElementKind::Inline(InlineType::Math)) {
            spans.push(self.math_span(doc, unit, EmphasisSet::default()));
        } else if let Action::Attribute { name, pre, post } =
            self.resolver.action(doc, unit, self.doc_rules)
        {
            if let Some(value) = doc.attr(unit, &name) {
                spans.push(TextSpan::inserted(unit, format!("{}{}{}", pre, value, post)));
            }
        } else {
            self.walk(doc, unit, EmphasisSet::default(), &mut spans);
        }
        spans
    }

    fn walk(&self, doc: &Document, node: NodeId, emphasis: EmphasisSet, spans: &mut Vec<TextSpan>) {
        for child in doc.children(node) {
            match doc.data(child) {
                NodeData::Text(text) => {
                    spans.push(TextSpan::text(child, text.as_str()).with_emphasis(emphasis));
                }
                NodeData::Brl(_) => {}
                NodeData::Element(element) => {
                    if element.is_block() || element.kind() == ElementKind::PageIndicator {
                        continue;
                    }
                    if element.kind() == ElementKind::Inline(InlineType::Math) {
                        if !self.resolver.action(doc, child, self.doc_rules).is_skip() {
                            spans.push(self.math_span(doc, child, emphasis));
                        }
                        continue;
                    }
                    match self.resolver.action(doc, child, self.doc_rules) {
                        Action::Skip => {}
                        Action::Emphasis(set) => {
                            let own = element.attr("emphasis").map(EmphasisSet::parse).unwrap_or_default();
                            self.walk(doc, child, emphasis.union(set).union(own), spans);
                        }
                        Action::NoTranslate => {
                            let set = EmphasisSet {
                                no_translate: true,
                                ..emphasis
                            };
                            self.walk(doc, child, set, spans);
                        }
                        Action::Attribute { name, pre, post } => match element.attr(&name) {
                            Some(value) => spans.push(
                                TextSpan::inserted(child, format!("{}{}{}", pre, value, post))
                                    .with_emphasis(emphasis),
                            ),
                            None => log::debug!("No {} attribute on {}", name, element.name),
                        },
                        Action::Generic | Action::Math { .. } => self.walk(doc, child, emphasis, spans),
                    }
                }
            }
        }
    }

    fn math_span(&self, doc: &Document, node: NodeId, emphasis: EmphasisSet) -> TextSpan {
        TextSpan::inserted(node, self.linear_math(doc, node))
            .with_content(ContentType::Math)
            .with_emphasis(emphasis)
    }

    /// Linear print form of a math element, built from the math actions.
    pub fn linear_math(&self, doc: &Document, node: NodeId) -> String {
        match doc.data(node) {
            NodeData::Text(text) => text.trim().to_string(),
            NodeData::Brl(_) => String::new(),
            NodeData::Element(_) => {
                let parts: Vec<String> = doc
                    .children(node)
                    .map(|c| self.linear_math(doc, c))
                    .filter(|p| !p.is_empty())
                    .collect();
                match self.resolver.action(doc, node, self.doc_rules) {
                    Action::Math { pre, mid, post } => format!("{}{}{}", pre, parts.join(&mid), post),
                    _ => parts.concat(),
                }
            }
        }
    }

    fn translate_unit(&self, doc: &Document, unit: NodeId) -> Result<Vec<(TextSpan, Translation)>> {
        let spans = self.collect_spans(doc, unit);
        let translations = self.translate(doc, &spans)?;
        Ok(spans.into_iter().map(|s| s.translated()).zip(translations).collect())
    }

    /// Translate spans. Runs of standard spans go through the table
    /// together; each math span is translated on its own.
    pub fn translate(&self, doc: &Document, spans: &[TextSpan]) -> Result<Vec<Translation>> {
        let mut out = Vec::with_capacity(spans.len());
        let mut start = 0;
        while start < spans.len() {
            if spans[start].content() == ContentType::Math {
                out.push(self.translate_math(doc, &spans[start])?);
                start += 1;
                continue;
            }
            let end = spans[start..]
                .iter()
                .position(|s| s.content() == ContentType::Math)
                .map(|p| start + p)
                .unwrap_or(spans.len());
            out.extend(self.translate_run(&spans[start..end])?);
            start = end;
        }
        Ok(out)
    }

    fn translate_math(&self, doc: &Document, span: &TextSpan) -> Result<Translation> {
        let tree = MathNode::from_document(doc, span.node())?;
        let braille = self.math_code.to_braille(&tree);
        // Math braille maps back to the start of the expression
        let index = vec![0; braille.chars().count()];
        let (braille, index) = apply_typeform(&braille, &index, span.emphasis());
        Ok(Translation { braille, index })
    }

    /// Table input for one span.
    fn table_input(&self, span: &TextSpan) -> String {
        if span.is_no_translate() {
            self.normalizer
                .normalize_braille(span.as_str())
                .chars()
                .map(|c| ascii_to_unicode(c).unwrap_or(c))
                .collect()
        } else {
            self.normalizer.normalize(span.as_str())
        }
    }

    fn translate_run(&self, spans: &[TextSpan]) -> Result<Vec<Translation>> {
        let mut input = String::new();
        let mut input_len = 0usize;
        // Per span: offset in the combined input, and leading chars dropped
        let mut starts = Vec::with_capacity(spans.len());
        let mut skipped = Vec::with_capacity(spans.len());
        for span in spans {
            let text = self.table_input(span);
            let drop = usize::from(input.ends_with(' ') && text.starts_with(' '));
            starts.push(input_len);
            skipped.push(drop);
            let kept: String = text.chars().skip(drop).collect();
            input_len += kept.chars().count();
            input.push_str(&kept);
        }

        let output = self.table.translate(&input)?;
        if output.index.len() != output.braille.chars().count() {
            return Err(Error::Translation(format!(
                "table {} returned {} index entries for {} characters",
                self.table.id(),
                output.index.len(),
                output.braille.chars().count()
            )));
        }

        let mut split = vec![Translation::default(); spans.len()];
        for (c, source) in output.braille.chars().zip(output.index.iter()) {
            let source = *source as usize;
            // Empty spans share a start with the next one; take the last
            let k = starts.partition_point(|s| *s <= source).saturating_sub(1);
            let local = source - starts[k] + skipped[k];
            split[k].push(c, local as u32);
        }

        Ok(split
            .into_iter()
            .zip(spans)
            .map(|(t, span)| {
                let (braille, index) = apply_typeform(&t.braille, &t.index, span.emphasis());
                Translation { braille, index }
            })
            .collect())
    }

    /// Translate a stand-alone string (running heads, labels).
    pub fn translate_text(&self, text: &str) -> Result<String> {
        let input = self.normalizer.normalize(text);
        Ok(self.table.translate(input.trim())?.braille)
    }

    /// Attach the translation of a span. Returns false for empty spans.
    fn attach(&self, doc: &mut Document, span: &TextSpan, translation: Translation) -> Result<bool> {
        if translation.braille.is_empty() && span.content() == ContentType::Standard {
            return Ok(false);
        }
        let original = match span.content() {
            ContentType::Standard => self.table_input(span),
            ContentType::Math => span.as_str().to_string(),
        };
        let data = BrlData::new(translation.braille, translation.index, original);
        match span.attach() {
            Attach::After(text_node) => {
                let id = doc.create(NodeData::Brl(data));
                doc.insert_after(text_node, id);
            }
            Attach::LastChild(element) => {
                if span.content() == ContentType::Math && doc.children(element).any(|c| doc.is_brl(c)) {
                    return Err(Error::invariant(
                        "math element already carries a translation",
                        doc.snippet(element),
                    ));
                }
                let id = doc.create(NodeData::Brl(data));
                doc.append_child(element, id);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;
    use crate::parser::XmlParser;
    use crate::style::{Matcher, StyleSheet};
    use crate::translate::table::{ComputerBraille, UebGrade1};
    use std::collections::BTreeMap;

    fn resolver() -> StyleResolver {
        let rules = RuleSet::new()
            .with_action(Matcher::name("mfrac"), Action::math("(", ")/(", ")"))
            .with_action(
                Matcher::typed("container", "image"),
                Action::Attribute {
                    name: "alt".into(),
                    pre: String::new(),
                    post: String::new(),
                },
            );
        StyleResolver::new(StyleSheet::from_defs(&BTreeMap::new()).unwrap(), rules).unwrap()
    }

    fn parse(xml: &str) -> Document {
        XmlParser::from_str_with_options(xml, Default::default()).parse().unwrap()
    }

    #[test]
    fn test_translate_paragraph() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(UebGrade1), MathCode::Nemeth).unwrap();
        let mut doc = parse(r#"<document><block type="paragraph">Hello World</block></document>"#);
        assert_eq!(translator.translate_document(&mut doc).unwrap(), 1);
        let block = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.braille_content(block), ",hello ,world");
    }

    #[test]
    fn test_spans_split_by_index() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(UebGrade1), MathCode::Nemeth).unwrap();
        let mut doc = parse(
            r#"<document><block type="paragraph">one <inline type="emphasis" emphasis="bold">Two</inline> 3</block></document>"#,
        );
        assert_eq!(translator.translate_document(&mut doc).unwrap(), 3);
        let brls: Vec<&BrlData> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|id| doc.brl(id))
            .collect();
        assert_eq!(brls[0].text, "one ");
        assert_eq!(brls[1].text, "^1,two");
        assert_eq!(brls[2].text, " #c");
        assert_eq!(brls[2].index, vec![0, 1, 1]);
    }

    #[test]
    fn test_no_translate_passes_through() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(UebGrade1), MathCode::Nemeth).unwrap();
        let mut doc = parse(
            r#"<document><block type="paragraph"><inline type="noTranslate">,,abc</inline></block></document>"#,
        );
        translator.translate_document(&mut doc).unwrap();
        let block = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.braille_content(block), ",,abc");
    }

    #[test]
    fn test_math_single_brl() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(UebGrade1), MathCode::Nemeth).unwrap();
        let mut doc = parse(
            r#"<document><block type="paragraph">x <inline type="math"><math><mfrac><mi>a</mi><mi>b</mi></mfrac></math></inline></block></document>"#,
        );
        translator.translate_document(&mut doc).unwrap();
        let math = doc
            .descendants(doc.root())
            .into_iter()
            .find(|id| doc.attr(*id, "type") == Some("math"))
            .unwrap();
        let brls: Vec<NodeId> = doc.children(math).filter(|c| doc.is_brl(*c)).collect();
        assert_eq!(brls.len(), 1);
        let data = doc.brl(brls[0]).unwrap();
        assert_eq!(data.text, "?a/b#");
        assert_eq!(data.original, "(a)/(b)");
    }

    #[test]
    fn test_second_math_translation_is_invariant_error() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(UebGrade1), MathCode::Nemeth).unwrap();
        let mut doc = Document::empty();
        let root = doc.root();
        let math = doc.append_element(root, Element::new("inline").with_attr("type", "math"));
        doc.append_text(math, "a/b");
        let span = TextSpan::inserted(math, "a/b").with_content(ContentType::Math);
        let translation = Translation {
            braille: "x".into(),
            index: vec![0],
        };
        assert!(translator.attach(&mut doc, &span, translation.clone()).unwrap());
        assert!(matches!(
            translator.attach(&mut doc, &span, translation),
            Err(Error::Invariant { .. })
        ));
    }

    #[test]
    fn test_attribute_action_and_skip() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(ComputerBraille), MathCode::Nemeth).unwrap();
        let mut doc = parse(
            r#"<document><head><meta name="title" content="T"/></head><block type="paragraph"><container type="image" alt="A cat"/></block></document>"#,
        );
        translator.translate_document(&mut doc).unwrap();
        let block = doc.last_child(doc.root()).unwrap();
        assert_eq!(doc.braille_content(block), "a cat");
    }

    #[test]
    fn test_image_outside_block_is_a_unit() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(ComputerBraille), MathCode::Nemeth).unwrap();
        let mut doc = parse(r#"<document><section><container type="image" alt="Map"/></section></document>"#);
        assert_eq!(translator.translate_document(&mut doc).unwrap(), 1);
        assert_eq!(doc.braille_content(doc.root()), "map");
    }

    #[test]
    fn test_translate_text() {
        let resolver = resolver();
        let translator = Translator::new(&resolver, Arc::new(UebGrade1), MathCode::Nemeth).unwrap();
        assert_eq!(translator.translate_text("  My Book ").unwrap(), ",my ,book");
    }
}
