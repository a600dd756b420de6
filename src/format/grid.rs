//! Fixed-size page grid of braille cells.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::NodeId;

/// What put a cell on the page. Back-references are never used to mutate
/// the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CellSource {
    /// Character `index` of the original text of `node`
    Text { node: NodeId, index: u32 },
    /// Braille or print page number
    PageNumber,
    /// Guide dots
    Guide,
    /// Layout furniture (running heads, separators)
    Reserved,
}

/// One braille cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// ASCII braille character (lowercase)
    pub ch: char,
    pub source: CellSource,
}

impl Cell {
    pub fn new(ch: char, source: CellSource) -> Self {
        Self { ch, source }
    }

    pub fn is_page_number(&self) -> bool {
        self.source == CellSource::PageNumber
    }
}

/// A `width x height` grid of optional cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<Cell>>,
}

impl PageGrid {
    /// Create an empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn offset(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(Error::GridOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y * self.width + x)
    }

    fn check_line(&self, y: usize) -> Result<()> {
        if y >= self.height {
            return Err(Error::GridOutOfBounds {
                x: 0,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// The cell at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Result<Option<&Cell>> {
        let offset = self.offset(x, y)?;
        Ok(self.cells[offset].as_ref())
    }

    /// Place a cell unless the position is taken. Returns whether it was placed.
    pub fn set_if_empty(&mut self, x: usize, y: usize, cell: Cell) -> Result<bool> {
        let offset = self.offset(x, y)?;
        if self.cells[offset].is_some() {
            return Ok(false);
        }
        self.cells[offset] = Some(cell);
        Ok(true)
    }

    /// Place a cell, returning the one it replaced.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<Option<Cell>> {
        let offset = self.offset(x, y)?;
        Ok(self.cells[offset].replace(cell))
    }

    /// Empty a position, returning its cell.
    pub fn clear(&mut self, x: usize, y: usize) -> Result<Option<Cell>> {
        let offset = self.offset(x, y)?;
        Ok(self.cells[offset].take())
    }

    /// Empty a whole line.
    pub fn clear_line(&mut self, y: usize) -> Result<()> {
        self.check_line(y)?;
        let start = y * self.width;
        self.cells[start..start + self.width].fill(None);
        Ok(())
    }

    /// Whether a line has no cells other than page numbers.
    pub fn is_line_empty(&self, y: usize) -> Result<bool> {
        self.check_line(y)?;
        let start = y * self.width;
        Ok(self.cells[start..start + self.width]
            .iter()
            .all(|c| c.map(|c| c.is_page_number()).unwrap_or(true)))
    }

    /// Whether every line is empty in the sense of [`is_line_empty`](Self::is_line_empty).
    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.map(|c| c.is_page_number()).unwrap_or(true))
    }

    /// Characters of a line, with spaces for empty cells.
    pub fn line_text(&self, y: usize) -> Result<String> {
        self.check_line(y)?;
        let start = y * self.width;
        Ok(self.cells[start..start + self.width]
            .iter()
            .map(|c| c.map(|c| c.ch).unwrap_or(' '))
            .collect())
    }

    /// All lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| c.map(|c| c.ch).unwrap_or(' ')).collect())
            .collect()
    }

    /// Insert `count` empty lines at `y`, moving the following lines down.
    /// Lines pushed past the bottom are returned, last line first.
    pub fn insert_rows(&mut self, y: usize, count: usize) -> Result<Vec<Vec<Option<Cell>>>> {
        if y > self.height {
            return Err(Error::GridOutOfBounds {
                x: 0,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let count = count.min(self.height - y);
        let mut dropped = Vec::with_capacity(count);
        for _ in 0..count {
            let last = (self.height - 1) * self.width;
            dropped.push(self.cells.drain(last..).collect());
            let at = y * self.width;
            self.cells
                .splice(at..at, std::iter::repeat(None).take(self.width));
        }
        Ok(dropped)
    }

    /// Remove a previously recorded run of cells. Cells placed elsewhere
    /// are untouched.
    pub fn retract(&mut self, positions: &[(usize, usize)]) -> Result<Vec<Cell>> {
        // Validate first so a bad position leaves the grid unchanged
        let offsets = positions
            .iter()
            .map(|(x, y)| self.offset(*x, *y))
            .collect::<Result<Vec<_>>>()?;
        Ok(offsets
            .into_iter()
            .filter_map(|o| self.cells[o].take())
            .collect())
    }

    /// Write a string of braille on a line starting at `x`.
    pub fn write_str(&mut self, x: usize, y: usize, text: &str, source: CellSource) -> Result<()> {
        for (i, ch) in text.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, source))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(ch: char) -> Cell {
        Cell::new(
            ch,
            CellSource::Text {
                node: NodeId(1),
                index: 0,
            },
        )
    }

    #[test]
    fn test_bounds() {
        let mut grid = PageGrid::new(4, 3);
        assert!(grid.get(3, 2).unwrap().is_none());
        assert!(matches!(
            grid.get(4, 0),
            Err(Error::GridOutOfBounds { x: 4, y: 0, width: 4, height: 3 })
        ));
        assert!(grid.set(0, 3, text('a')).is_err());
        assert!(grid.clear_line(3).is_err());
    }

    #[test]
    fn test_set_if_empty_and_overwrite() {
        let mut grid = PageGrid::new(4, 3);
        assert!(grid.set_if_empty(1, 1, text('a')).unwrap());
        assert!(!grid.set_if_empty(1, 1, text('b')).unwrap());
        assert_eq!(grid.get(1, 1).unwrap().map(|c| c.ch), Some('a'));
        let old = grid.set(1, 1, text('c')).unwrap();
        assert_eq!(old.map(|c| c.ch), Some('a'));
        assert_eq!(grid.line_text(1).unwrap(), " c  ");
    }

    #[test]
    fn test_line_with_page_number_is_empty() {
        let mut grid = PageGrid::new(6, 2);
        grid.write_str(4, 1, "#a", CellSource::PageNumber).unwrap();
        assert!(grid.is_line_empty(1).unwrap());
        assert!(grid.is_blank());
        grid.set(0, 1, text('x')).unwrap();
        assert!(!grid.is_line_empty(1).unwrap());
        grid.clear_line(1).unwrap();
        assert_eq!(grid.line_text(1).unwrap(), "      ");
    }

    #[test]
    fn test_insert_rows() {
        let mut grid = PageGrid::new(2, 3);
        grid.write_str(0, 0, "ab", CellSource::Reserved).unwrap();
        grid.write_str(0, 2, "cd", CellSource::Reserved).unwrap();
        let dropped = grid.insert_rows(1, 1).unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0][0].map(|c| c.ch), Some('c'));
        assert_eq!(grid.lines(), vec!["ab", "  ", "  "]);
        assert!(grid.insert_rows(4, 1).is_err());
    }

    #[test]
    fn test_retract_leaves_other_cells() {
        let mut grid = PageGrid::new(5, 2);
        grid.write_str(0, 0, "abc", CellSource::Reserved).unwrap();
        grid.write_str(0, 1, "xy", CellSource::Reserved).unwrap();
        let removed = grid.retract(&[(0, 0), (1, 0), (2, 0)]).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(grid.lines(), vec!["     ", "xy   "]);
        assert!(grid.retract(&[(0, 1), (9, 9)]).is_err());
        assert_eq!(grid.line_text(1).unwrap(), "xy   ");
    }
}
