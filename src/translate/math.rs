//! Mathematics: ASCII-math and MathML to a canonical tree, then to braille.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Document, NodeData, NodeId};
use crate::parser::{ParseOptions, XmlParser};

/// Canonical math expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathNode {
    /// Sequence of items
    Row(Vec<MathNode>),
    Number(String),
    Ident(String),
    Op(String),
    Frac(Box<MathNode>, Box<MathNode>),
    Sup(Box<MathNode>, Box<MathNode>),
    Sub(Box<MathNode>, Box<MathNode>),
    Sqrt(Box<MathNode>),
    /// Bracketed group
    Fenced {
        open: String,
        close: String,
        inner: Box<MathNode>,
    },
}

/// Multi-letter identifiers recognized in ASCII-math.
const FUNCTIONS: [&str; 6] = ["sin", "cos", "tan", "log", "ln", "exp"];

/// Collapse single-item rows.
fn row(mut items: Vec<MathNode>) -> MathNode {
    if items.len() == 1 {
        items.remove(0)
    } else {
        MathNode::Row(items)
    }
}

impl MathNode {
    /// Parse ASCII-math such as `(a+b)/c` or `x^2`.
    pub fn parse_ascii(input: &str) -> Result<MathNode> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(Error::MathSyntax("empty expression".to_string()));
        }
        let mut parser = AsciiParser { tokens, pos: 0 };
        let items = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(Error::MathSyntax(format!("unexpected {:?}", tok)));
        }
        Ok(MathNode::Row(items))
    }

    /// Parse a MathML string.
    pub fn from_mathml_str(mathml: &str) -> Result<MathNode> {
        let doc = parse_mathml(mathml)?;
        Self::from_element(&doc, doc.root())
    }

    /// Read the math element `node`: MathML children, or ASCII-math text.
    ///
    /// Malformed input is an [`Error::Structural`] naming the offending element.
    pub fn from_document(doc: &Document, node: NodeId) -> Result<MathNode> {
        let elements: Vec<NodeId> = doc.children(node).filter(|c| doc.is_element(*c)).collect();
        if let Some(math) = elements
            .iter()
            .find(|c| doc.element(**c).map(|e| e.local_name() == "math").unwrap_or(false))
        {
            return Self::from_element(doc, *math);
        }
        if !elements.is_empty() {
            let items = elements
                .iter()
                .map(|c| Self::from_element(doc, *c))
                .collect::<Result<Vec<_>>>()?;
            return Ok(MathNode::Row(items));
        }
        let text = doc.text_content(node);
        if text.trim().is_empty() {
            return Err(Error::structural("Math element has no content", doc.snippet(node)));
        }
        Self::parse_ascii(&text).map_err(|e| Error::structural(e.to_string(), doc.snippet(node)))
    }

    fn from_element(doc: &Document, node: NodeId) -> Result<MathNode> {
        let Some(element) = doc.element(node) else {
            return Err(Error::structural("Expected a MathML element", doc.snippet(node)));
        };
        let children: Vec<NodeId> = doc.children(node).filter(|c| doc.is_element(*c)).collect();
        let convert = |ids: &[NodeId]| -> Result<Vec<MathNode>> {
            ids.iter().map(|c| Self::from_element(doc, *c)).collect()
        };
        let token = || doc.text_content(node).trim().to_string();
        let binary = |name: &str| -> Result<(MathNode, MathNode)> {
            if children.len() != 2 {
                return Err(Error::structural(
                    format!("<{}> needs 2 children, found {}", name, children.len()),
                    doc.snippet(node),
                ));
            }
            Ok((
                Self::from_element(doc, children[0])?,
                Self::from_element(doc, children[1])?,
            ))
        };

        Ok(match element.local_name() {
            "math" => MathNode::Row(convert(&children)?),
            "mrow" | "mstyle" | "mpadded" => {
                let items = convert(&children)?;
                fenced(items)
            }
            "semantics" => match children.first() {
                Some(first) => Self::from_element(doc, *first)?,
                None => MathNode::Row(Vec::new()),
            },
            "mn" => MathNode::Number(token()),
            "mi" | "mtext" => MathNode::Ident(token()),
            "mo" => MathNode::Op(token()),
            "mfrac" => {
                let (num, den) = binary("mfrac")?;
                MathNode::Frac(Box::new(num), Box::new(den))
            }
            "msup" => {
                let (base, exp) = binary("msup")?;
                MathNode::Sup(Box::new(base), Box::new(exp))
            }
            "msub" => {
                let (base, sub) = binary("msub")?;
                MathNode::Sub(Box::new(base), Box::new(sub))
            }
            "msqrt" => MathNode::Sqrt(Box::new(row(convert(&children)?))),
            other => {
                log::warn!("Unsupported MathML element <{}>, reading its children", other);
                row(convert(&children)?)
            }
        })
    }

    /// Canonical MathML.
    pub fn to_mathml(&self) -> String {
        let mut out = String::from("<math>");
        match self {
            MathNode::Row(items) => items.iter().for_each(|i| i.write_mathml(&mut out)),
            other => other.write_mathml(&mut out),
        }
        out.push_str("</math>");
        out
    }

    fn write_mathml(&self, out: &mut String) {
        let token = |out: &mut String, tag: &str, text: &str| {
            out.push_str(&format!("<{}>{}</{}>", tag, quick_xml::escape::escape(text), tag));
        };
        match self {
            MathNode::Row(items) => {
                out.push_str("<mrow>");
                items.iter().for_each(|i| i.write_mathml(out));
                out.push_str("</mrow>");
            }
            MathNode::Number(n) => token(out, "mn", n),
            MathNode::Ident(i) => token(out, "mi", i),
            MathNode::Op(o) => token(out, "mo", o),
            MathNode::Frac(a, b) | MathNode::Sup(a, b) | MathNode::Sub(a, b) => {
                let tag = match self {
                    MathNode::Frac(..) => "mfrac",
                    MathNode::Sup(..) => "msup",
                    _ => "msub",
                };
                out.push_str(&format!("<{}>", tag));
                a.write_mathml(out);
                b.write_mathml(out);
                out.push_str(&format!("</{}>", tag));
            }
            MathNode::Sqrt(inner) => {
                out.push_str("<msqrt>");
                match inner.as_ref() {
                    MathNode::Row(items) => items.iter().for_each(|i| i.write_mathml(out)),
                    other => other.write_mathml(out),
                }
                out.push_str("</msqrt>");
            }
            MathNode::Fenced { open, close, inner } => {
                out.push_str("<mrow>");
                token(out, "mo", open);
                match inner.as_ref() {
                    MathNode::Row(items) => items.iter().for_each(|i| i.write_mathml(out)),
                    other => other.write_mathml(out),
                }
                token(out, "mo", close);
                out.push_str("</mrow>");
            }
        }
    }

    /// Whether the node is a single braille unit (no grouping needed).
    fn is_atomic(&self) -> bool {
        match self {
            MathNode::Number(_) | MathNode::Ident(_) => true,
            MathNode::Row(items) => items.len() == 1 && items[0].is_atomic(),
            _ => false,
        }
    }
}

/// Recognize `<mrow><mo>(</mo>...<mo>)</mo></mrow>` as a fenced group.
fn fenced(mut items: Vec<MathNode>) -> MathNode {
    let is_open = |n: &MathNode| matches!(n, MathNode::Op(o) if matches!(o.as_str(), "(" | "[" | "{"));
    let is_close = |n: &MathNode| matches!(n, MathNode::Op(o) if matches!(o.as_str(), ")" | "]" | "}"));
    if items.len() >= 2 && is_open(&items[0]) && is_close(&items[items.len() - 1]) {
        let close = match items.pop() {
            Some(MathNode::Op(c)) => c,
            _ => String::new(),
        };
        let open = match items.remove(0) {
            MathNode::Op(o) => o,
            _ => String::new(),
        };
        return MathNode::Fenced {
            open,
            close,
            inner: Box::new(row(items)),
        };
    }
    row(items)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Ident(String),
    Op(char),
    Open(char),
    Close(char),
    Slash,
    Caret,
    Underscore,
    Sqrt,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_digit()
                    || (chars[i] == '.' && chars.get(i + 1).map(|d| d.is_ascii_digit()).unwrap_or(false)))
            {
                i += 1;
            }
            tokens.push(Token::Number(chars[start..i].iter().collect()));
        } else if c.is_alphabetic() {
            let rest: String = chars[i..].iter().collect();
            if rest.starts_with("sqrt") {
                tokens.push(Token::Sqrt);
                i += 4;
            } else if let Some(f) = FUNCTIONS.iter().find(|f| rest.starts_with(**f)) {
                tokens.push(Token::Ident(f.to_string()));
                i += f.len();
            } else {
                tokens.push(Token::Ident(c.to_string()));
                i += 1;
            }
        } else {
            tokens.push(match c {
                '(' | '[' | '{' => Token::Open(c),
                ')' | ']' | '}' => Token::Close(c),
                '/' => Token::Slash,
                '^' => Token::Caret,
                '_' => Token::Underscore,
                '+' | '-' | '=' | '*' | '<' | '>' | ',' | '!' | '\u{d7}' | '\u{b7}' => Token::Op(c),
                other => return Err(Error::MathSyntax(format!("unexpected character {:?}", other))),
            });
            i += 1;
        }
    }
    Ok(tokens)
}

struct AsciiParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl AsciiParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    /// Items up to a closing bracket or the end.
    fn expr(&mut self) -> Result<Vec<MathNode>> {
        let mut items = Vec::new();
        while let Some(tok) = self.peek() {
            if matches!(tok, Token::Close(_)) {
                break;
            }
            items.push(self.term()?);
        }
        Ok(items)
    }

    fn term(&mut self) -> Result<MathNode> {
        let num = self.intermediate()?;
        if self.peek() == Some(&Token::Slash) {
            self.pos += 1;
            let den = self.intermediate()?;
            return Ok(MathNode::Frac(Box::new(unfence(num)), Box::new(unfence(den))));
        }
        Ok(num)
    }

    fn intermediate(&mut self) -> Result<MathNode> {
        let mut base = self.simple()?;
        if self.peek() == Some(&Token::Underscore) {
            self.pos += 1;
            let sub = self.simple()?;
            base = MathNode::Sub(Box::new(base), Box::new(unfence(sub)));
        }
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exp = self.simple()?;
            base = MathNode::Sup(Box::new(base), Box::new(unfence(exp)));
        }
        Ok(base)
    }

    fn simple(&mut self) -> Result<MathNode> {
        match self.next() {
            Some(Token::Number(n)) => Ok(MathNode::Number(n)),
            Some(Token::Ident(i)) => Ok(MathNode::Ident(i)),
            Some(Token::Op(c)) => Ok(MathNode::Op(c.to_string())),
            Some(Token::Sqrt) => {
                let inner = self.simple()?;
                Ok(MathNode::Sqrt(Box::new(unfence(inner))))
            }
            Some(Token::Open(open)) => {
                let items = self.expr()?;
                match self.next() {
                    Some(Token::Close(close)) => Ok(MathNode::Fenced {
                        open: open.to_string(),
                        close: close.to_string(),
                        inner: Box::new(row(items)),
                    }),
                    _ => Err(Error::MathSyntax(format!("unclosed {:?}", open))),
                }
            }
            Some(tok) => Err(Error::MathSyntax(format!("unexpected {:?}", tok))),
            None => Err(Error::MathSyntax("unexpected end of expression".to_string())),
        }
    }
}

/// Brackets around a fraction, script or radicand operand are dropped.
fn unfence(node: MathNode) -> MathNode {
    match node {
        MathNode::Fenced { open, inner, .. } if open == "(" => *inner,
        other => other,
    }
}

fn parse_mathml(mathml: &str) -> Result<Document> {
    XmlParser::from_str_with_options(mathml, ParseOptions::default())
        .parse()
        .map_err(|e| Error::MathSyntax(e.to_string()))
}

/// Order-independent canonical form of a MathML element tree.
#[derive(Debug, PartialEq, Eq)]
enum Canon {
    Element {
        name: String,
        attrs: BTreeMap<String, String>,
        children: Vec<Canon>,
    },
    Text(String),
}

fn canon(doc: &Document, node: NodeId) -> Option<Canon> {
    match doc.data(node) {
        NodeData::Element(e) => Some(Canon::Element {
            name: e.local_name().to_string(),
            attrs: e.attrs.clone(),
            children: doc.children(node).filter_map(|c| canon(doc, c)).collect(),
        }),
        NodeData::Text(t) => {
            let t = t.trim();
            (!t.is_empty()).then(|| Canon::Text(t.to_string()))
        }
        NodeData::Brl(_) => None,
    }
}

/// Whether two MathML strings have the same structure, ignoring attribute
/// order, namespace prefixes and surrounding whitespace.
pub fn mathml_equivalent(a: &str, b: &str) -> Result<bool> {
    let a = parse_mathml(a)?;
    let b = parse_mathml(b)?;
    Ok(canon(&a, a.root()) == canon(&b, b.root()))
}

/// Braille mathematics code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MathCode {
    #[default]
    Nemeth,
    UebTechnical,
}

impl MathCode {
    /// Translate an expression to ASCII braille.
    pub fn to_braille(&self, node: &MathNode) -> String {
        let mut out = String::new();
        match self {
            MathCode::Nemeth => nemeth(node, &mut out),
            MathCode::UebTechnical => ueb(node, &mut out),
        }
        out.trim().to_string()
    }
}

fn letters(ident: &str, out: &mut String) {
    for c in ident.chars() {
        if c.is_uppercase() {
            out.push(',');
        }
        out.extend(c.to_lowercase());
    }
}

fn nemeth(node: &MathNode, out: &mut String) {
    match node {
        MathNode::Row(items) => items.iter().for_each(|i| nemeth(i, out)),
        MathNode::Number(n) => {
            // Numeric indicator at the start of a line or after a space
            if out.is_empty() || out.ends_with(' ') {
                out.push('#');
            }
            out.push_str(n);
        }
        MathNode::Ident(i) => letters(i, out),
        MathNode::Op(o) => out.push_str(match o.as_str() {
            "+" => "+",
            "-" | "\u{2212}" => "-",
            "=" => " .k ",
            "<" => " \"k ",
            ">" => " .1 ",
            "*" | "\u{d7}" => "@*",
            "\u{b7}" => "*",
            "," => "1",
            "!" => "&",
            "(" => "(",
            ")" => ")",
            "[" => "@(",
            "]" => "@)",
            other => other,
        }),
        MathNode::Frac(num, den) => {
            out.push('?');
            nemeth(num, out);
            out.push('/');
            nemeth(den, out);
            out.push('#');
        }
        MathNode::Sup(base, exp) => {
            nemeth(base, out);
            out.push('^');
            nemeth(exp, out);
            out.push('"');
        }
        MathNode::Sub(base, sub) => {
            nemeth(base, out);
            // Numeric subscripts of a letter need no level indicator
            match (base.as_ref(), sub.as_ref()) {
                (MathNode::Ident(_), MathNode::Number(n)) => out.push_str(n),
                _ => {
                    out.push(';');
                    nemeth(sub, out);
                    out.push('"');
                }
            }
        }
        MathNode::Sqrt(inner) => {
            out.push('>');
            nemeth(inner, out);
            out.push(']');
        }
        MathNode::Fenced { open, close, inner } => {
            nemeth(&MathNode::Op(open.clone()), out);
            nemeth(inner, out);
            nemeth(&MathNode::Op(close.clone()), out);
        }
    }
}

fn ueb_number(n: &str, out: &mut String) {
    for c in n.chars() {
        match c {
            '0' => out.push('j'),
            '1'..='9' => out.push((b'a' + (c as u8 - b'1')) as char),
            '.' => out.push('4'),
            other => out.push(other),
        }
    }
}

fn ueb(node: &MathNode, out: &mut String) {
    match node {
        MathNode::Row(items) => items.iter().for_each(|i| ueb(i, out)),
        MathNode::Number(n) => {
            out.push('#');
            ueb_number(n, out);
        }
        MathNode::Ident(i) => {
            // A letter a-j directly after a number needs the grade 1 indicator
            let first = i.chars().next().map(|c| c.to_ascii_lowercase());
            if numeric_mode(out) && matches!(first, Some('a'..='j')) {
                out.push(';');
            }
            letters(i, out);
        }
        MathNode::Op(o) => out.push_str(match o.as_str() {
            "+" => "\"6",
            "-" | "\u{2212}" => "\"-",
            "=" => " \"7 ",
            "<" => " @< ",
            ">" => " @> ",
            "*" | "\u{d7}" => "\"8",
            "\u{b7}" => "\"4",
            "," => "1",
            "!" => "6",
            "(" => "\"<",
            ")" => "\">",
            "[" => ".<",
            "]" => ".>",
            other => other,
        }),
        MathNode::Frac(num, den) => match (num.as_ref(), den.as_ref()) {
            (MathNode::Number(a), MathNode::Number(b)) => {
                out.push('#');
                ueb_number(a, out);
                out.push('/');
                ueb_number(b, out);
            }
            _ => {
                out.push('(');
                ueb(num, out);
                out.push('.');
                out.push('/');
                ueb(den, out);
                out.push(')');
            }
        },
        MathNode::Sup(base, exp) => {
            ueb(base, out);
            out.push('9');
            ueb_grouped(exp, out);
        }
        MathNode::Sub(base, sub) => {
            ueb(base, out);
            out.push('5');
            ueb_grouped(sub, out);
        }
        MathNode::Sqrt(inner) => {
            out.push('%');
            ueb(inner, out);
            out.push('+');
        }
        MathNode::Fenced { open, close, inner } => {
            ueb(&MathNode::Op(open.clone()), out);
            ueb(inner, out);
            ueb(&MathNode::Op(close.clone()), out);
        }
    }
}

/// Whether the output ends inside a number.
fn numeric_mode(out: &str) -> bool {
    match out.rfind('#') {
        Some(pos) => {
            let tail = &out[pos + 1..];
            !tail.is_empty() && tail.chars().all(|c| "abcdefghij41/".contains(c))
        }
        None => false,
    }
}

fn ueb_grouped(node: &MathNode, out: &mut String) {
    if node.is_atomic() {
        ueb(node, out);
    } else {
        out.push('<');
        ueb(node, out);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    #[test]
    fn test_parse_ascii_fraction() {
        let node = MathNode::parse_ascii("a/b").unwrap();
        assert_eq!(
            node,
            MathNode::Row(vec![MathNode::Frac(
                Box::new(MathNode::Ident("a".into())),
                Box::new(MathNode::Ident("b".into()))
            )])
        );
        assert_eq!(node.to_mathml(), "<math><mfrac><mi>a</mi><mi>b</mi></mfrac></math>");
    }

    #[test]
    fn test_brackets_dropped_in_fraction() {
        let node = MathNode::parse_ascii("(a+b)/c").unwrap();
        assert_eq!(
            node.to_mathml(),
            "<math><mfrac><mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow><mi>c</mi></mfrac></math>"
        );
    }

    #[test]
    fn test_mathml_round_trip() {
        let mathml = MathNode::parse_ascii("a/b").unwrap().to_mathml();
        let back = MathNode::from_mathml_str(&mathml).unwrap();
        assert_eq!(back.to_mathml(), mathml);

        let fenced = MathNode::parse_ascii("2(x+1)").unwrap().to_mathml();
        assert_eq!(MathNode::from_mathml_str(&fenced).unwrap().to_mathml(), fenced);
    }

    #[test]
    fn test_mathml_equivalent_ignores_attribute_order() {
        let a = r#"<math display="block" class="x"><mfrac><mi>a</mi><mi>b</mi></mfrac></math>"#;
        let b = r#"<math class="x" display="block">
            <mfrac> <mi> a </mi> <mi>b</mi> </mfrac>
        </math>"#;
        assert!(mathml_equivalent(a, b).unwrap());
        let c = r#"<math class="x" display="block"><mfrac><mi>b</mi><mi>a</mi></mfrac></math>"#;
        assert!(!mathml_equivalent(a, c).unwrap());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(MathNode::parse_ascii("(a+b"), Err(Error::MathSyntax(_))));
        assert!(matches!(MathNode::parse_ascii("a/"), Err(Error::MathSyntax(_))));
        assert!(matches!(MathNode::parse_ascii("a)"), Err(Error::MathSyntax(_))));
        match MathNode::from_mathml_str("<math><mfrac><mi>a</mi></mfrac></math>") {
            Err(Error::Structural { message, node }) => {
                assert!(message.contains("needs 2 children"));
                assert!(node.starts_with("<mfrac"));
            }
            other => panic!("expected a structural error, got {:?}", other),
        }
    }

    #[test]
    fn test_nemeth() {
        let code = MathCode::Nemeth;
        assert_eq!(code.to_braille(&MathNode::parse_ascii("a/b").unwrap()), "?a/b#");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("x^2").unwrap()), "x^2\"");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("x_1").unwrap()), "x1");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("x = 2").unwrap()), "x .k #2");
    }

    #[test]
    fn test_ueb_technical() {
        let code = MathCode::UebTechnical;
        assert_eq!(code.to_braille(&MathNode::parse_ascii("a/b").unwrap()), "(a./b)");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("3/4").unwrap()), "#c/d");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("x^2").unwrap()), "x9#b");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("x^(n+1)").unwrap()), "x9<n\"6#a>");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("1+1=2").unwrap()), "#a\"6#a \"7 #b");
        assert_eq!(code.to_braille(&MathNode::parse_ascii("2a").unwrap()), "#b;a");
    }

    #[test]
    fn test_from_document() {
        let mut doc = Document::empty();
        let root = doc.root();
        let math = doc.append_element(root, Element::new("inline").with_attr("type", "math"));
        doc.append_text(math, "a/b");
        let node = MathNode::from_document(&doc, math).unwrap();
        assert_eq!(node, MathNode::parse_ascii("a/b").unwrap());

        let empty = doc.append_element(root, Element::new("inline").with_attr("type", "math"));
        assert!(matches!(
            MathNode::from_document(&doc, empty),
            Err(Error::Structural { .. })
        ));
    }
}
