//! BRF (braille ready file) output.

use super::options::{BrfOptions, Encoding};
use crate::error::{Error, Result};
use crate::format::BraillePage;
use crate::translate::ascii_to_unicode;

/// Form feed written between pages.
pub const PAGE_BREAK: char = '\u{0c}';

/// Write pages as BRF.
///
/// Every line is written at full width with spaces for empty cells and
/// ends with the configured line ending; pages are separated by a form
/// feed. Interpoint output is padded with a blank page to an even count.
pub fn to_brf(pages: &[BraillePage], options: &BrfOptions) -> Result<Vec<u8>> {
    Ok(to_brf_string(pages, options)?.into_bytes())
}

/// [`to_brf`] as a string.
pub fn to_brf_string(pages: &[BraillePage], options: &BrfOptions) -> Result<String> {
    let eol = options.line_ending.as_str();
    let mut sheets: Vec<Vec<String>> = pages.iter().map(|p| p.lines()).collect();
    if options.interpoint && sheets.len() % 2 == 1 {
        if let Some(last) = pages.last() {
            let grid = last.grid();
            sheets.push(vec![" ".repeat(grid.width()); grid.height()]);
        }
    }

    let mut out = String::new();
    for (i, lines) in sheets.iter().enumerate() {
        if i > 0 {
            out.push(PAGE_BREAK);
        }
        for line in lines {
            out.push_str(&encode_line(line, options)?);
            out.push_str(eol);
        }
    }
    Ok(out)
}

fn encode_line(line: &str, options: &BrfOptions) -> Result<String> {
    match options.encoding {
        Encoding::Ascii if options.uppercase => Ok(line.to_ascii_uppercase()),
        Encoding::Ascii => Ok(line.to_string()),
        Encoding::Unicode => line
            .chars()
            .map(|c| {
                ascii_to_unicode(c).ok_or_else(|| {
                    Error::Render(format!("{:?} is not an ASCII braille character", c))
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{CellSource, PageNumbering};
    use crate::render::LineEnding;

    fn page(index: usize, text: &str) -> BraillePage {
        let mut page = BraillePage::new(index, 4, 2, PageNumbering::new());
        page.grid_mut()
            .unwrap()
            .write_str(0, 0, text, CellSource::Reserved)
            .unwrap();
        page
    }

    #[test]
    fn test_lines_and_page_breaks() {
        let pages = vec![page(0, ",ab"), page(1, "cd")];
        let brf = to_brf_string(&pages, &BrfOptions::default()).unwrap();
        assert_eq!(brf, ",AB \r\n    \r\n\u{0c}CD  \r\n    \r\n");
        assert_eq!(brf.matches(PAGE_BREAK).count(), 1);
    }

    #[test]
    fn test_interpoint_padding() {
        let pages = vec![page(0, "a")];
        let options = BrfOptions::new()
            .with_interpoint(true)
            .with_line_ending(LineEnding::Lf)
            .with_uppercase(false);
        let brf = to_brf_string(&pages, &options).unwrap();
        assert_eq!(brf, "a   \n    \n\u{0c}    \n    \n");
    }

    #[test]
    fn test_unicode() {
        let pages = vec![page(0, "a")];
        let options = BrfOptions::new()
            .with_encoding(Encoding::Unicode)
            .with_line_ending(LineEnding::Lf);
        let brf = to_brf_string(&pages, &options).unwrap();
        assert!(brf.starts_with("\u{2801}\u{2800}\u{2800}\u{2800}\n"));
    }

    #[test]
    fn test_pure() {
        let pages = vec![page(0, "ab")];
        let options = BrfOptions::default();
        assert_eq!(to_brf(&pages, &options).unwrap(), to_brf(&pages, &options).unwrap());
    }
}
