//! Tagged XML reader built on quick-xml.

use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::{
    local_part, prefix_part, BrlData, Document, Element, ElementKind, NodeData, NodeId, FORMAT_NS,
    FORMAT_PREFIX,
};

use super::options::{ErrorMode, ParseOptions};

/// Reader for tagged XML input documents.
pub struct XmlParser {
    content: String,
    options: ParseOptions,
}

/// An element on the open-element stack.
struct OpenElement {
    node: NodeId,
    name: String,
    /// Number of namespace scopes this element pushed.
    scopes: usize,
}

/// A `brl:brl` element being read.
struct OpenBrl {
    index: Option<String>,
    original: String,
    text: String,
}

impl XmlParser {
    /// Open an XML file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open an XML file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Read XML from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Read XML from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        let content = std::str::from_utf8(strip_bom(data))
            .map_err(|e| Error::Xml(format!("input is not UTF-8: {}", e)))?;
        Ok(Self {
            content: content.to_string(),
            options,
        })
    }

    /// Read XML from a string.
    pub fn from_str_with_options(content: &str, options: ParseOptions) -> Self {
        Self {
            content: content.to_string(),
            options,
        }
    }

    /// Read XML from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Build the document tree.
    pub fn parse(&self) -> Result<Document> {
        let lenient = self.options.error_mode == ErrorMode::Lenient;
        let mut reader = Reader::from_str(&self.content);
        reader.config_mut().check_end_names = !lenient;

        let mut doc: Option<Document> = None;
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut scopes: Vec<(String, String)> = vec![
            ("xml".to_string(), "http://www.w3.org/XML/1998/namespace".to_string()),
        ];
        let mut text = String::new();
        let mut brl: Option<OpenBrl> = None;
        let mut root_closed = false;

        loop {
            let event = reader.read_event();
            // Text and entity references arrive as separate events; merge them.
            let is_text = matches!(
                event,
                Ok(Event::Text(_)) | Ok(Event::GeneralRef(_)) | Ok(Event::CData(_))
            );
            if !is_text && brl.is_none() {
                if let (Some(doc), Some(open)) = (doc.as_mut(), stack.last()) {
                    self.flush_text(doc, open.node, &mut text);
                }
                text.clear();
            }

            match event {
                Ok(Event::Start(e)) => {
                    if root_closed {
                        return Err(Error::Xml("content after the root element".to_string()));
                    }
                    if brl.is_some() {
                        return Err(Error::Xml("markup inside a brl element".to_string()));
                    }
                    let (element, pushed) = self.read_element(&e, &mut scopes)?;
                    if is_brl_element(&element) {
                        brl = Some(OpenBrl {
                            index: element.attr("index").map(str::to_string),
                            original: element.attr("original").unwrap_or("").to_string(),
                            text: String::new(),
                        });
                        scopes.truncate(scopes.len() - pushed);
                        continue;
                    }
                    let name = element.name.clone();
                    let node = self.attach(&mut doc, &stack, &scopes, element)?;
                    stack.push(OpenElement {
                        node,
                        name,
                        scopes: pushed,
                    });
                    if self.options.max_depth > 0 && stack.len() > self.options.max_depth {
                        return Err(Error::Xml(format!(
                            "maximum nesting depth {} exceeded",
                            self.options.max_depth
                        )));
                    }
                }
                Ok(Event::Empty(e)) => {
                    if root_closed {
                        return Err(Error::Xml("content after the root element".to_string()));
                    }
                    let (element, pushed) = self.read_element(&e, &mut scopes)?;
                    if is_brl_element(&element) {
                        scopes.truncate(scopes.len() - pushed);
                        if !self.options.strip_formatting {
                            if let (Some(doc), Some(open)) = (doc.as_mut(), stack.last()) {
                                let data = BrlData::new(
                                    "",
                                    Vec::new(),
                                    element.attr("original").unwrap_or(""),
                                );
                                let id = doc.create(NodeData::Brl(data));
                                doc.append_child(open.node, id);
                            }
                        }
                        continue;
                    }
                    self.attach(&mut doc, &stack, &scopes, element)?;
                    scopes.truncate(scopes.len() - pushed);
                    if stack.is_empty() {
                        root_closed = true;
                    }
                }
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    match brl.as_mut() {
                        Some(b) => b.text.push_str(&raw),
                        None => text.push_str(&raw),
                    }
                }
                Ok(Event::CData(e)) => {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    match brl.as_mut() {
                        Some(b) => b.text.push_str(&raw),
                        None => text.push_str(&raw),
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    let resolved = match resolve_entity(&entity) {
                        Some(resolved) => resolved,
                        None if lenient => {
                            log::warn!("Unknown entity &{}; kept literally", entity);
                            format!("&{};", entity)
                        }
                        None => return Err(Error::Xml(format!("unknown entity &{};", entity))),
                    };
                    match brl.as_mut() {
                        Some(b) => b.text.push_str(&resolved),
                        None => text.push_str(&resolved),
                    }
                }
                Ok(Event::End(e)) => {
                    if let Some(open) = brl.take() {
                        if !self.options.strip_formatting {
                            if let (Some(doc), Some(parent)) = (doc.as_mut(), stack.last()) {
                                let index = match open.index.as_deref() {
                                    Some(s) => BrlData::parse_index(s).ok_or_else(|| {
                                        Error::Xml(format!("malformed brl index \"{}\"", s))
                                    })?,
                                    None => Vec::new(),
                                };
                                let data = BrlData::new(open.text, index, open.original);
                                let id = doc.create(NodeData::Brl(data));
                                doc.append_child(parent.node, id);
                            }
                        }
                        continue;
                    }
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match stack.iter().rposition(|o| o.name == name) {
                        Some(pos) => {
                            if pos + 1 != stack.len() {
                                log::warn!("Unclosed element(s) before </{}>", name);
                            }
                            for open in stack.drain(pos..).rev() {
                                scopes.truncate(scopes.len() - open.scopes);
                            }
                        }
                        None if lenient => {
                            log::warn!("Ignoring stray end tag </{}>", name);
                        }
                        None => {
                            return Err(Error::Xml(format!("unexpected end tag </{}>", name)));
                        }
                    }
                    if stack.is_empty() {
                        root_closed = true;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::from(e)),
                _ => {}
            }
        }

        if !stack.is_empty() && !lenient {
            return Err(Error::Xml(format!(
                "unexpected end of input inside <{}>",
                stack.last().map(|o| o.name.as_str()).unwrap_or("")
            )));
        }

        let mut doc = doc.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;
        read_metadata(&mut doc);
        log::debug!("Parsed document with {} nodes", doc.len());
        Ok(doc)
    }

    /// Decode an element start tag, pushing its namespace declarations.
    fn read_element(
        &self,
        e: &BytesStart<'_>,
        scopes: &mut Vec<(String, String)>,
    ) -> Result<(Element, usize)> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut pushed = 0;

        for attr in e.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(err) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping malformed attribute on <{}>: {}", name, err);
                    continue;
                }
                Err(err) => return Err(Error::Xml(err.to_string())),
            };
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = quick_xml::escape::unescape(&raw)
                .map_err(|err| Error::Xml(format!("attribute {}: {}", key, err)))?
                .into_owned();

            if key == "xmlns" {
                scopes.push((String::new(), value));
                pushed += 1;
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scopes.push((prefix.to_string(), value));
                pushed += 1;
            } else {
                attrs.push((key, value));
            }
        }

        let lookup = |prefix: &str| -> Option<String> {
            scopes
                .iter()
                .rev()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.clone())
        };

        let mut element = Element::new(name.clone());
        element.namespace = match prefix_part(&name) {
            Some(prefix) => lookup(prefix),
            None => lookup("").filter(|uri| !uri.is_empty()),
        };

        for (key, value) in attrs {
            // Formatting attributes are stored under the canonical prefix.
            let key = match prefix_part(&key) {
                Some(prefix) if prefix != FORMAT_PREFIX && lookup(prefix).as_deref() == Some(FORMAT_NS) => {
                    format!("{}:{}", FORMAT_PREFIX, local_part(&key))
                }
                _ => key,
            };
            if self.options.strip_formatting && Element::is_format_attr(&key) {
                continue;
            }
            element.attrs.insert(key, value);
        }

        Ok((element, pushed))
    }

    /// Append an element to the current parent, or make it the root.
    fn attach(
        &self,
        doc: &mut Option<Document>,
        stack: &[OpenElement],
        scopes: &[(String, String)],
        element: Element,
    ) -> Result<NodeId> {
        match (doc.as_mut(), stack.last()) {
            (Some(doc), Some(parent)) => Ok(doc.append_element(parent.node, element)),
            (None, _) => {
                let mut created = Document::new(element);
                created.namespaces = scopes
                    .iter()
                    .filter(|(prefix, _)| prefix != "xml")
                    .cloned()
                    .collect();
                let root = created.root();
                *doc = Some(created);
                Ok(root)
            }
            (Some(_), None) => Err(Error::Xml("multiple root elements".to_string())),
        }
    }

    fn flush_text(&self, doc: &mut Document, parent: NodeId, text: &mut String) {
        if text.is_empty() {
            return;
        }
        let keep = self.options.keep_whitespace
            || !text.trim().is_empty()
            || holds_inline_text(doc, parent);
        if keep {
            doc.append_text(parent, std::mem::take(text));
        }
    }
}

/// Whether whitespace is significant inside this element.
fn holds_inline_text(doc: &Document, id: NodeId) -> bool {
    match doc.element(id).map(|e| e.kind()) {
        Some(ElementKind::Block(_)) | Some(ElementKind::Span(_)) | Some(ElementKind::Inline(_)) => {
            // Leading whitespace before the first child carries no content.
            doc.first_child(id).is_some()
        }
        _ => false,
    }
}

fn is_brl_element(element: &Element) -> bool {
    element.namespace.as_deref() == Some(FORMAT_NS) && element.local_name() == "brl"
}

/// Populate metadata from `<head><meta name=".." content=".."/></head>`.
fn read_metadata(doc: &mut Document) {
    let root = doc.root();
    if let Some(lang) = doc.attr(root, "xml:lang").map(str::to_string) {
        doc.metadata.language = Some(lang);
    }
    let heads: Vec<NodeId> = doc.child_elements(root, "head").collect();
    for head in heads {
        let metas: Vec<NodeId> = doc.child_elements(head, "meta").collect();
        for meta in metas {
            let name = doc.attr(meta, "name").map(str::to_string);
            let content = doc
                .attr(meta, "content")
                .map(str::to_string)
                .unwrap_or_else(|| doc.text_content(meta));
            if let Some(name) = name {
                doc.metadata.set(&name, content);
            }
        }
    }
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };
    code.and_then(char::from_u32).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockType, ContainerType};

    fn parse(xml: &str) -> Document {
        XmlParser::from_str_with_options(xml, ParseOptions::default())
            .parse()
            .unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let doc = parse("<document><block type=\"paragraph\">Hello <inline type=\"emphasis\" emphasis=\"bold\">world</inline></block></document>");
        let root = doc.root();
        let block = doc.first_child(root).unwrap();
        assert_eq!(
            doc.element(block).map(|e| e.kind()),
            Some(ElementKind::Block(BlockType::Paragraph))
        );
        assert_eq!(doc.text_content(block), "Hello world");
        assert_eq!(doc.children(block).count(), 2);
    }

    #[test]
    fn test_whitespace_between_blocks_dropped() {
        let doc = parse("<document>\n  <container type=\"list\">\n    <block type=\"listItem\">a</block>\n  </container>\n</document>");
        let root = doc.root();
        let list = doc.first_child(root).unwrap();
        assert_eq!(
            doc.element(list).map(|e| e.kind()),
            Some(ElementKind::Container(ContainerType::List))
        );
        assert_eq!(doc.children(root).count(), 1);
        assert_eq!(doc.children(list).count(), 1);
    }

    #[test]
    fn test_entities() {
        let doc = parse("<document><block>a &amp; b &#x41;&#66;</block></document>");
        assert_eq!(doc.text_content(doc.root()), "a & b AB");
    }

    #[test]
    fn test_unknown_entity() {
        let xml = "<document><block>&foo;</block></document>";
        let strict = XmlParser::from_str_with_options(xml, ParseOptions::default()).parse();
        assert!(strict.is_err());
        let lenient = XmlParser::from_str_with_options(xml, ParseOptions::new().lenient())
            .parse()
            .unwrap();
        assert_eq!(lenient.text_content(lenient.root()), "&foo;");
    }

    #[test]
    fn test_namespaces() {
        let doc = parse("<document xmlns:m=\"http://www.w3.org/1998/Math/MathML\" xmlns:f=\"urn:brlpage:format\"><m:math f:tableType=\"simple\"/></document>");
        let math = doc.first_child(doc.root()).unwrap();
        let e = doc.element(math).unwrap();
        assert_eq!(e.namespace.as_deref(), Some("http://www.w3.org/1998/Math/MathML"));
        assert_eq!(e.attr("brl:tableType"), Some("simple"));
    }

    #[test]
    fn test_brl_roundtrip() {
        let xml = "<document xmlns:brl=\"urn:brlpage:format\"><block>Hi<brl:brl index=\"0 0 1\" original=\"Hi\">,hi</brl:brl></block></document>";
        let doc = parse(xml);
        let block = doc.first_child(doc.root()).unwrap();
        let brl = doc.last_child(block).unwrap();
        let data = doc.brl(brl).unwrap();
        assert_eq!(data.text, ",hi");
        assert_eq!(data.index, vec![0, 0, 1]);
        assert_eq!(doc.braille_content(block), ",hi");

        let stripped = XmlParser::from_str_with_options(xml, ParseOptions::new().with_strip_formatting(true))
            .parse()
            .unwrap();
        let block = stripped.first_child(stripped.root()).unwrap();
        assert_eq!(stripped.children(block).count(), 1);
    }

    #[test]
    fn test_metadata() {
        let doc = parse("<document><head><meta name=\"title\" content=\"Book\"/></head></document>");
        assert_eq!(doc.metadata.title.as_deref(), Some("Book"));
    }

    #[test]
    fn test_errors() {
        assert!(XmlParser::from_str_with_options("", ParseOptions::default()).parse().is_err());
        assert!(XmlParser::from_str_with_options("<a><b></a>", ParseOptions::default()).parse().is_err());
        assert!(XmlParser::from_bytes(&[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom(&[0xEF, 0xBB, 0xBF, b'h']), b"h");
        assert_eq!(strip_bom(b"hi"), b"hi");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("lt"), Some("<".to_string()));
        assert_eq!(resolve_entity("#x2019"), Some("\u{2019}".to_string()));
        assert_eq!(resolve_entity("bogus"), None);
    }
}
