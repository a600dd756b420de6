//! Braille and print page numbering.

use serde::{Deserialize, Serialize};

/// Kind of braille page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageNumberType {
    #[default]
    Normal,
    /// Continuation pages (supplements), prefixed `c`
    Continuation,
    /// Preliminary pages, prefixed `p`
    FrontMatter,
}

impl PageNumberType {
    fn slot(self) -> usize {
        match self {
            PageNumberType::Normal => 0,
            PageNumberType::Continuation => 1,
            PageNumberType::FrontMatter => 2,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            PageNumberType::Normal => "",
            PageNumberType::Continuation => "c",
            PageNumberType::FrontMatter => "p",
        }
    }

    /// Parse a `pageType` attribute value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(PageNumberType::Normal),
            "continuation" => Some(PageNumberType::Continuation),
            "frontMatter" | "front-matter" | "preliminary" => Some(PageNumberType::FrontMatter),
            _ => None,
        }
    }
}

/// Braille rendering of a number: numeric indicator, then digits as the
/// letters a-j. Non-digits (roman numerals) are written as letters.
pub fn number_braille(label: &str) -> String {
    let mut out = String::new();
    let mut numeric = false;
    for c in label.chars() {
        if c.is_ascii_digit() {
            if !numeric {
                out.push('#');
                numeric = true;
            }
            out.push(match c {
                '0' => 'j',
                d => (b'a' + (d as u8 - b'1')) as char,
            });
        } else {
            if numeric && matches!(c.to_ascii_lowercase(), 'a'..='j') {
                out.push(';');
            }
            numeric = false;
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

/// Page counters per number type plus the print page label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageNumbering {
    counters: [u32; 3],
    current: PageNumberType,
    print_label: Option<String>,
    continuation: u32,
}

impl PageNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbering for the next page of type `ty`. `self` is unchanged.
    pub fn next_page(&self, ty: PageNumberType) -> Self {
        let mut next = self.clone();
        next.counters[ty.slot()] += 1;
        next.current = ty;
        next
    }

    pub fn current_type(&self) -> PageNumberType {
        self.current
    }

    /// Number of the current page within its type.
    pub fn number(&self) -> u32 {
        self.counters[self.current.slot()]
    }

    pub fn count(&self, ty: PageNumberType) -> u32 {
        self.counters[ty.slot()]
    }

    /// Restart numbering of a type.
    pub fn reset(&mut self, ty: PageNumberType) {
        self.counters[ty.slot()] = 0;
    }

    /// Braille page number, e.g. `#c` or `p#b`.
    pub fn braille_label(&self) -> String {
        format!(
            "{}{}",
            self.current.prefix(),
            number_braille(&self.number().to_string())
        )
    }

    pub fn print_label(&self) -> Option<&str> {
        self.print_label.as_deref()
    }

    /// Start a new print page; clears the continuation letter.
    pub fn set_print_label(&mut self, label: impl Into<String>) {
        self.print_label = Some(label.into());
        self.continuation = 0;
    }

    pub fn continuation(&self) -> u32 {
        self.continuation
    }

    pub fn increment_continuation(&mut self) {
        self.continuation += 1;
    }

    pub fn decrement_continuation(&mut self) {
        self.continuation = self.continuation.saturating_sub(1);
    }

    pub fn reset_continuation(&mut self) {
        self.continuation = 0;
    }

    /// Continuation letters: a..z, then aa..zz, and so on.
    pub fn continuation_letter(&self) -> Option<String> {
        if self.continuation == 0 {
            return None;
        }
        let n = self.continuation - 1;
        let letter = (b'a' + (n % 26) as u8) as char;
        Some(std::iter::repeat(letter).take((n / 26 + 1) as usize).collect())
    }

    /// Braille print page label with its continuation letter first,
    /// e.g. `a#ab` for the second braille page of print page 12.
    pub fn print_label_braille(&self) -> Option<String> {
        let label = self.print_label.as_deref()?;
        let letters = self.continuation_letter().unwrap_or_default();
        Some(format!("{}{}", letters, number_braille(label)))
    }
}
