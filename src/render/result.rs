//! Statistics of a formatting pass.

use serde::{Deserialize, Serialize};

use crate::format::BraillePage;

/// Statistics collected from formatted pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatStats {
    /// Total number of braille pages
    pub page_count: usize,

    /// Pages without content
    pub blank_pages: usize,

    /// Lines holding content (page numbers alone do not count)
    pub content_lines: usize,

    /// Non-blank cells, page numbers included
    pub cells: usize,
}

impl FormatStats {
    /// Collect statistics from pages.
    pub fn from_pages(pages: &[BraillePage]) -> Self {
        let mut stats = Self {
            page_count: pages.len(),
            ..Default::default()
        };
        for page in pages {
            if page.is_blank() {
                stats.blank_pages += 1;
            }
            let grid = page.grid();
            for y in 0..grid.height() {
                if let Ok(false) = grid.is_line_empty(y) {
                    stats.content_lines += 1;
                }
            }
            stats.cells += page
                .lines()
                .iter()
                .map(|l| l.chars().filter(|c| *c != ' ').count())
                .sum::<usize>();
        }
        stats
    }
}
