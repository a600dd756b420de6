//! Braille rule tables.
//!
//! A table is a pure function from print text to ASCII braille plus an index
//! map giving, for every output character, the offset of the input character
//! that produced it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};

/// The 64 ASCII braille characters, indexed by dot pattern
/// (dot 1 = bit 0 ... dot 6 = bit 5).
pub const ASCII_BRAILLE: &str =
    " A1B'K2L@CIF/MSP\"E3H9O6R^DJG>NTQ,*5<-U8V.%[$+X!&;:4\\0Z7(_?W]#Y)=";

/// Id of the uncontracted UEB table.
pub const UEB_GRADE1: &str = "en-ueb-g1";

/// Id of the computer braille table.
pub const COMPUTER_BRAILLE: &str = "en-us-comp6";

/// Dot pattern of an ASCII braille character (case-insensitive).
pub fn ascii_to_dots(c: char) -> Option<u8> {
    let upper = c.to_ascii_uppercase();
    ASCII_BRAILLE
        .chars()
        .position(|b| b == upper)
        .map(|i| i as u8)
}

/// ASCII braille character (lowercase) for a dot pattern.
pub fn dots_to_ascii(dots: u8) -> char {
    ASCII_BRAILLE
        .chars()
        .nth((dots & 0x3f) as usize)
        .map(|c| c.to_ascii_lowercase())
        .unwrap_or(' ')
}

/// Unicode braille character for an ASCII braille character.
pub fn ascii_to_unicode(c: char) -> Option<char> {
    ascii_to_dots(c).and_then(|d| char::from_u32(0x2800 + d as u32))
}

/// ASCII braille character for a Unicode braille character (6 dots only).
pub fn unicode_to_ascii(c: char) -> Option<char> {
    let code = c as u32;
    if (0x2800..=0x28ff).contains(&code) {
        Some(dots_to_ascii(((code - 0x2800) & 0x3f) as u8))
    } else {
        None
    }
}

/// Output of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOutput {
    /// ASCII braille (lowercase)
    pub braille: String,
    /// Input character offset for every output character
    pub index: Vec<u32>,
}

impl TableOutput {
    fn push(&mut self, s: &str, source: usize) {
        for c in s.chars() {
            self.braille.push(c);
            self.index.push(source as u32);
        }
    }
}

/// A braille translation table.
///
/// Implementations must be pure: the same input always yields the same
/// output. Unicode braille characters in the input are passed through.
pub trait BrailleTable: Send + Sync {
    /// Table id, e.g. `en-ueb-g1`.
    fn id(&self) -> &str;

    /// Translate print text.
    ///
    /// May return [`Error::Interrupted`] when the table is being reloaded;
    /// callers decide whether to retry.
    fn translate(&self, input: &str) -> Result<TableOutput>;
}

/// Uncontracted Unified English Braille.
#[derive(Debug, Default, Clone, Copy)]
pub struct UebGrade1;

impl UebGrade1 {
    fn punctuation(c: char, prev: Option<char>) -> Option<&'static str> {
        Some(match c {
            ',' => "1",
            ';' => "2",
            ':' => "3",
            '.' => "4",
            '!' => "6",
            '?' => "8",
            '\'' | '\u{2019}' => "'",
            '"' => {
                // Opening when at the start or after a space
                if prev.map(|p| p.is_whitespace() || "([{".contains(p)).unwrap_or(true) {
                    "8"
                } else {
                    "0"
                }
            }
            '\u{201c}' => "8",
            '\u{201d}' => "0",
            '\u{2018}' => ",8",
            '(' => "\"<",
            ')' => "\">",
            '[' => ".<",
            ']' => ".>",
            '{' => "_<",
            '}' => "_>",
            '-' => "-",
            '\u{2013}' | '\u{2014}' => ",-",
            '/' => "_/",
            '\\' => "_*",
            '&' => "@&",
            '*' => "\"9",
            '#' => "_?",
            '%' => ".0",
            '$' => "@s",
            '+' => "\"6",
            '=' => "\"7",
            '<' => "@<",
            '>' => "@>",
            '@' => "@a",
            '_' => ".-",
            '~' => "@9",
            '\u{2026}' => "444",
            '\u{2022}' => "_4",
            '\u{a3}' => "@l",
            '\u{20ac}' => "@e",
            '\u{b0}' => "~j",
            _ => return None,
        })
    }
}

impl BrailleTable for UebGrade1 {
    fn id(&self) -> &str {
        UEB_GRADE1
    }

    fn translate(&self, input: &str) -> Result<TableOutput> {
        let chars: Vec<char> = input.chars().collect();
        let mut out = TableOutput::default();
        let mut i = 0;
        let mut numeric = false;

        while i < chars.len() {
            let c = chars[i];

            if let Some(b) = unicode_to_ascii(c) {
                numeric = false;
                out.push(&b.to_string(), i);
                i += 1;
                continue;
            }

            if c.is_ascii_digit() {
                if !numeric {
                    out.push("#", i);
                    numeric = true;
                }
                out.push(&digit_letter(c).to_string(), i);
                i += 1;
                continue;
            }

            if numeric {
                // Decimal point and digit-group comma continue the number
                let next_digit = chars.get(i + 1).map(|n| n.is_ascii_digit()).unwrap_or(false);
                if (c == '.' || c == ',') && next_digit {
                    out.push(if c == '.' { "4" } else { "1" }, i);
                    i += 1;
                    continue;
                }
            }

            if c.is_alphabetic() {
                let start = i;
                let mut end = i;
                while end < chars.len() && chars[end].is_alphabetic() {
                    end += 1;
                }
                let word = &chars[start..end];
                let letters = word.iter().filter(|l| l.is_ascii_alphabetic()).count();
                let all_caps = letters >= 2 && word.iter().all(|l| !l.is_lowercase());

                // Letters a-j right after a number need the grade 1 indicator
                if numeric && matches!(c.to_ascii_lowercase(), 'a'..='j') {
                    out.push(";", i);
                }
                numeric = false;

                if all_caps {
                    out.push(",,", start);
                }
                for (k, l) in word.iter().enumerate() {
                    let pos = start + k;
                    if !all_caps && l.is_uppercase() {
                        out.push(",", pos);
                    }
                    match letter_cell(*l) {
                        Some(cell) => out.push(cell, pos),
                        None => {
                            log::warn!("No braille for {:?} in {}, using '?'", l, UEB_GRADE1);
                            out.push("?", pos);
                        }
                    }
                }
                i = end;
                continue;
            }

            numeric = false;
            if c.is_whitespace() {
                out.push(" ", i);
            } else if let Some(p) = Self::punctuation(c, if i > 0 { Some(chars[i - 1]) } else { None }) {
                out.push(p, i);
            } else {
                log::warn!("No braille for {:?} in {}, using '?'", c, UEB_GRADE1);
                out.push("?", i);
            }
            i += 1;
        }
        Ok(out)
    }
}

/// Braille for a letter, including common accented forms (accent dropped).
fn letter_cell(c: char) -> Option<&'static str> {
    const LETTERS: [&str; 26] = [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
        "s", "t", "u", "v", "w", "x", "y", "z",
    ];
    let base = match c.to_lowercase().next().unwrap_or(c) {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    };
    if base.is_ascii_lowercase() {
        Some(LETTERS[(base as u8 - b'a') as usize])
    } else {
        None
    }
}

/// Digits 1-9,0 are written with the letters a-j.
fn digit_letter(c: char) -> char {
    match c {
        '0' => 'j',
        d => (b'a' + (d as u8 - b'1')) as char,
    }
}

/// Six-dot computer braille: ASCII passes through one cell per character.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComputerBraille;

impl BrailleTable for ComputerBraille {
    fn id(&self) -> &str {
        COMPUTER_BRAILLE
    }

    fn translate(&self, input: &str) -> Result<TableOutput> {
        let mut out = TableOutput::default();
        for (i, c) in input.chars().enumerate() {
            let cell = if let Some(b) = unicode_to_ascii(c) {
                b
            } else if c.is_whitespace() {
                ' '
            } else {
                let c = match c {
                    '`' => '@',
                    '{' => '[',
                    '|' => '\\',
                    '}' => ']',
                    '~' => '^',
                    other => other,
                };
                match ascii_to_dots(c) {
                    Some(dots) => dots_to_ascii(dots),
                    None => {
                        log::warn!("No braille for {:?} in {}, using '?'", c, COMPUTER_BRAILLE);
                        '?'
                    }
                }
            };
            out.push(&cell.to_string(), i);
        }
        Ok(out)
    }
}

/// Tables available to an engine, by id.
#[derive(Clone)]
pub struct TableRegistry {
    tables: HashMap<String, Arc<dyn BrailleTable>>,
}

impl TableRegistry {
    /// Registry with the built-in tables.
    pub fn new() -> Self {
        let mut registry = Self {
            tables: HashMap::new(),
        };
        registry.register(Arc::new(UebGrade1));
        registry.register(Arc::new(ComputerBraille));
        registry
    }

    /// Add or replace a table.
    pub fn register(&mut self, table: Arc<dyn BrailleTable>) {
        self.tables.insert(table.id().to_string(), table);
    }

    /// Look up a table.
    pub fn get(&self, id: &str) -> Result<Arc<dyn BrailleTable>> {
        self.tables
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownTable(id.to_string()))
    }

    /// Whether a table is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.tables.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tables.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRegistry")
            .field("tables", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ueb(s: &str) -> String {
        UebGrade1.translate(s).unwrap().braille
    }

    #[test]
    fn test_ascii_braille_table() {
        assert_eq!(ASCII_BRAILLE.chars().count(), 64);
        assert_eq!(ascii_to_dots('a'), Some(1));
        assert_eq!(ascii_to_dots('#'), Some(0b111100));
        assert_eq!(dots_to_ascii(3), 'b');
        assert_eq!(ascii_to_unicode('a'), Some('\u{2801}'));
        assert_eq!(unicode_to_ascii('\u{2803}'), Some('b'));
        assert_eq!(unicode_to_ascii('x'), None);
    }

    #[test]
    fn test_ueb_letters_and_capitals() {
        assert_eq!(ueb("hello"), "hello");
        assert_eq!(ueb("Hello"), ",hello");
        assert_eq!(ueb("HELLO WORLD"), ",,hello ,,world");
        assert_eq!(ueb("I"), ",i");
    }

    #[test]
    fn test_ueb_numbers() {
        assert_eq!(ueb("123"), "#abc");
        assert_eq!(ueb("3.5"), "#c4e");
        assert_eq!(ueb("3d"), "#c;d");
        assert_eq!(ueb("3 x"), "#c x");
    }

    #[test]
    fn test_ueb_punctuation() {
        assert_eq!(ueb("Hi, you."), ",hi1 you4");
        assert_eq!(ueb("\"ok\""), "8ok0");
        assert_eq!(ueb("(a)"), "\"<a\">");
    }

    #[test]
    fn test_index_map() {
        let out = UebGrade1.translate("Hi 12").unwrap();
        assert_eq!(out.braille, ",hi #ab");
        assert_eq!(out.index, vec![0, 0, 1, 2, 3, 3, 4]);
    }

    #[test]
    fn test_unicode_braille_passthrough() {
        assert_eq!(ueb("\u{2801}\u{2803}"), "ab");
        assert_eq!(ComputerBraille.translate("\u{2809}").unwrap().braille, "c");
    }

    #[test]
    fn test_computer_braille() {
        let out = ComputerBraille.translate("HELLO WORLD").unwrap();
        assert_eq!(out.braille, "hello world");
        assert_eq!(out.index.len(), 11);
    }

    #[test]
    fn test_registry() {
        let registry = TableRegistry::new();
        assert!(registry.get(UEB_GRADE1).is_ok());
        assert!(matches!(registry.get("xx"), Err(Error::UnknownTable(_))));
        assert_eq!(registry.ids(), vec![COMPUTER_BRAILLE.to_string(), UEB_GRADE1.to_string()]);
    }
}
