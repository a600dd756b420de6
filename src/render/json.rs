//! JSON dump of formatted pages.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::format::{BraillePage, CellSource};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// One page as written to JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDump {
    /// Position in the output, from 1
    pub index: usize,
    pub braille_page: Option<String>,
    pub print_page: Option<String>,
    /// Lines with trailing blanks removed
    pub lines: Vec<String>,
    /// Source of every non-empty cell, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<CellDump>>,
}

/// Position and source of one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDump {
    pub x: usize,
    pub y: usize,
    pub ch: char,
    pub source: CellSource,
}

impl PageDump {
    pub fn from_page(page: &BraillePage, with_cells: bool) -> Self {
        let cells = with_cells.then(|| {
            let grid = page.grid();
            let mut out = Vec::new();
            for y in 0..grid.height() {
                for x in 0..grid.width() {
                    if let Ok(Some(cell)) = grid.get(x, y) {
                        out.push(CellDump {
                            x,
                            y,
                            ch: cell.ch,
                            source: cell.source,
                        });
                    }
                }
            }
            out
        });
        Self {
            index: page.index + 1,
            braille_page: page.braille_label().map(str::to_string),
            print_page: page.print_label().map(str::to_string),
            lines: page
                .lines()
                .into_iter()
                .map(|l| l.trim_end().to_string())
                .collect(),
            cells,
        }
    }
}

/// Convert pages to JSON.
pub fn to_json(pages: &[BraillePage], format: JsonFormat, with_cells: bool) -> Result<String> {
    let dump: Vec<PageDump> = pages.iter().map(|p| PageDump::from_page(p, with_cells)).collect();
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&dump),
        JsonFormat::Compact => serde_json::to_string(&dump),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PageNumbering;

    fn pages() -> Vec<BraillePage> {
        let mut page = BraillePage::new(0, 6, 2, PageNumbering::new());
        page.set_labels(Some("#a".into()), None);
        page.grid_mut()
            .unwrap()
            .write_str(0, 0, ",hi", CellSource::Reserved)
            .unwrap();
        vec![page]
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&pages(), JsonFormat::Pretty, false).unwrap();
        assert!(json.contains("\"braillePage\": \"#a\""));
        assert!(json.contains("\",hi\""));
        assert!(!json.contains("\"cells\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact_with_cells() {
        let json = to_json(&pages(), JsonFormat::Compact, true).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"kind\":\"reserved\""));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["cells"].as_array().map(|a| a.len()), Some(3));
    }
}
