//! UEB typeform indicators.

use crate::model::EmphasisSet;

/// Indicator set for one typeform.
struct Typeform {
    symbol: &'static str,
    word: &'static str,
    passage: &'static str,
    terminator: &'static str,
}

const ITALIC: Typeform = Typeform {
    symbol: ".2",
    word: ".1",
    passage: ".7",
    terminator: ".'",
};

const BOLD: Typeform = Typeform {
    symbol: "^2",
    word: "^1",
    passage: "^7",
    terminator: "^'",
};

const UNDERLINE: Typeform = Typeform {
    symbol: "_2",
    word: "_1",
    passage: "_7",
    terminator: "_'",
};

const SCRIPT: Typeform = Typeform {
    symbol: "@2",
    word: "@1",
    passage: "@7",
    terminator: "@'",
};

/// Passages of at least this many words use passage indicators.
pub const PASSAGE_WORDS: usize = 3;

fn typeforms(set: EmphasisSet) -> Vec<&'static Typeform> {
    let mut forms = Vec::new();
    if set.bold {
        forms.push(&BOLD);
    }
    if set.italic {
        forms.push(&ITALIC);
    }
    if set.underline {
        forms.push(&UNDERLINE);
    }
    if set.script {
        forms.push(&SCRIPT);
    }
    forms
}

/// Wrap translated braille in typeform indicators.
///
/// `index` holds one source offset per braille character; indicator cells
/// take the offset of the character they precede (or follow, for
/// terminators).
pub fn apply_typeform(braille: &str, index: &[u32], set: EmphasisSet) -> (String, Vec<u32>) {
    let cells: Vec<char> = braille.chars().collect();
    if !set.has_typeform() || cells.iter().all(|c| *c == ' ') {
        return (braille.to_string(), index.to_vec());
    }
    let forms = typeforms(set);
    let offset = |i: usize| index.get(i).copied().unwrap_or(0);
    let last = offset(cells.len().saturating_sub(1));

    let mut out = String::new();
    let mut out_index = Vec::new();
    let push = |s: &str, at: u32, out: &mut String, out_index: &mut Vec<u32>| {
        for c in s.chars() {
            out.push(c);
            out_index.push(at);
        }
    };

    // Word boundaries in the braille
    let mut words: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in cells.iter().enumerate() {
        match (c == &' ', start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                words.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, cells.len()));
    }

    let non_blank = cells.iter().filter(|c| **c != ' ').count();
    if non_blank == 1 {
        for (i, c) in cells.iter().enumerate() {
            if *c != ' ' {
                for form in &forms {
                    push(form.symbol, offset(i), &mut out, &mut out_index);
                }
            }
            push(&c.to_string(), offset(i), &mut out, &mut out_index);
        }
    } else if words.len() >= PASSAGE_WORDS {
        let first = words.first().map(|w| w.0).unwrap_or(0);
        for (i, c) in cells.iter().enumerate() {
            if i == first {
                for form in &forms {
                    push(form.passage, offset(i), &mut out, &mut out_index);
                }
            }
            push(&c.to_string(), offset(i), &mut out, &mut out_index);
        }
        // Terminators go right after the last non-blank cell
        let trailing = cells.iter().rev().take_while(|c| **c == ' ').count();
        let keep = out.chars().count() - trailing;
        let tail: String = out.chars().skip(keep).collect();
        let tail_index: Vec<u32> = out_index.split_off(keep);
        out = out.chars().take(keep).collect();
        for form in forms.iter().rev() {
            push(form.terminator, last, &mut out, &mut out_index);
        }
        out.push_str(&tail);
        out_index.extend(tail_index);
    } else {
        let starts: Vec<usize> = words.iter().map(|w| w.0).collect();
        for (i, c) in cells.iter().enumerate() {
            if starts.contains(&i) {
                for form in &forms {
                    push(form.word, offset(i), &mut out, &mut out_index);
                }
            }
            push(&c.to_string(), offset(i), &mut out, &mut out_index);
        }
    }
    (out, out_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(s: &str) -> Vec<u32> {
        (0..s.chars().count() as u32).collect()
    }

    #[test]
    fn test_no_typeform() {
        let (out, index) = apply_typeform("abc", &idx("abc"), EmphasisSet::default());
        assert_eq!(out, "abc");
        assert_eq!(index, vec![0, 1, 2]);
    }

    #[test]
    fn test_symbol_and_word() {
        let italic = EmphasisSet::parse("italic");
        assert_eq!(apply_typeform("x", &[0], italic).0, ".2x");
        let (out, index) = apply_typeform("word", &idx("word"), italic);
        assert_eq!(out, ".1word");
        assert_eq!(index, vec![0, 0, 0, 1, 2, 3]);
        assert_eq!(apply_typeform("two words", &idx("two words"), italic).0, ".1two .1words");
    }

    #[test]
    fn test_passage() {
        let bold = EmphasisSet::parse("bold");
        let text = "one two three ";
        let (out, index) = apply_typeform(text, &idx(text), bold);
        assert_eq!(out, "^7one two three^' ");
        assert_eq!(index.len(), out.chars().count());
    }

    #[test]
    fn test_combined_typeforms() {
        let set = EmphasisSet::parse("bold italic");
        assert_eq!(apply_typeform("hi", &[0, 1], set).0, "^1.1hi");
    }
}
