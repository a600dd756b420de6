//! Print text normalization applied before table translation.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Options for text normalization.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Expand ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Remove Private Use Area (PUA) characters
    pub remove_pua: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Collapse runs of whitespace (including newlines) to one space
    pub collapse_whitespace: bool,

    /// Map typographic spaces and soft hyphens to plain forms
    pub simplify_spaces: bool,
}

impl NormalizeOptions {
    /// Only NFC and whitespace collapsing.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: false,
            remove_pua: false,
            remove_replacement_char: false,
            collapse_whitespace: true,
            simplify_spaces: false,
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_pua: true,
            remove_replacement_char: true,
            collapse_whitespace: true,
            simplify_spaces: true,
        }
    }
}

/// Text normalizer.
#[derive(Debug, Clone)]
pub struct Normalizer {
    options: NormalizeOptions,
    whitespace: Regex,
    ligature_map: Vec<(&'static str, &'static str)>,
}

impl Normalizer {
    /// Create a normalizer with the given options.
    pub fn new(options: NormalizeOptions) -> Result<Self> {
        Ok(Self {
            options,
            whitespace: Regex::new(r"\s+").map_err(|e| Error::Config(e.to_string()))?,
            ligature_map: vec![
                ("\u{FB00}", "ff"),
                ("\u{FB01}", "fi"),
                ("\u{FB02}", "fl"),
                ("\u{FB03}", "ffi"),
                ("\u{FB04}", "ffl"),
                ("\u{FB05}", "st"),
                ("\u{FB06}", "st"),
            ],
        })
    }

    /// Normalize print text.
    pub fn normalize(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.options.normalize_unicode {
            result = result.nfc().collect();
        }

        if self.options.fix_ligatures {
            for (ligature, replacement) in &self.ligature_map {
                result = result.replace(ligature, replacement);
            }
        }

        if self.options.remove_pua {
            result = remove_pua_chars(&result);
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        if self.options.simplify_spaces {
            result = result
                .chars()
                .filter(|c| *c != '\u{AD}' && *c != '\u{200B}')
                .map(|c| match c {
                    '\u{A0}' | '\u{2002}'..='\u{200A}' | '\u{202F}' => ' ',
                    other => other,
                })
                .collect();
        }

        if self.options.collapse_whitespace {
            result = self.whitespace.replace_all(&result, " ").into_owned();
        }

        result
    }

    /// Normalize text that is already braille: whitespace only.
    pub fn normalize_braille(&self, text: &str) -> String {
        if self.options.collapse_whitespace {
            self.whitespace.replace_all(text, " ").into_owned()
        } else {
            text.to_string()
        }
    }
}

fn remove_pua_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            let code = *c as u32;
            !(0xE000..=0xF8FF).contains(&code)
                && !(0xF0000..=0xFFFFD).contains(&code)
                && !(0x100000..=0x10FFFD).contains(&code)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nfc() {
        let n = Normalizer::new(NormalizeOptions::minimal()).unwrap();
        // e + combining acute -> é
        assert_eq!(n.normalize("e\u{301}"), "\u{e9}");
    }

    #[test]
    fn test_whitespace_and_ligatures() {
        let n = Normalizer::new(NormalizeOptions::default()).unwrap();
        assert_eq!(n.normalize("a \n\t b"), "a b");
        assert_eq!(n.normalize("\u{FB01}ne"), "fine");
        assert_eq!(n.normalize("x\u{A0}y"), "x y");
        assert_eq!(n.normalize("bad\u{FFFD}\u{E000}"), "bad");
    }

    #[test]
    fn test_braille_untouched() {
        let n = Normalizer::new(NormalizeOptions::default()).unwrap();
        assert_eq!(n.normalize_braille(",hi  ,,ok"), ",hi ,,ok");
    }
}
