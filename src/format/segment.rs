//! Placement of one run of cells on a line.

use crate::style::Align;

/// Left/right bounds and alignment of a run. A line may hold several
/// segments (table columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    /// First usable column
    pub left: usize,
    /// One past the last usable column
    pub right: usize,
    pub align: Align,
    /// First line of a new block
    pub start: bool,
}

impl SegmentInfo {
    pub fn new(left: usize, right: usize, align: Align) -> Self {
        Self {
            left,
            right: right.max(left),
            align,
            start: false,
        }
    }

    pub fn starting(mut self, start: bool) -> Self {
        self.start = start;
        self
    }

    /// Usable cells.
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    /// Column where a run of `len` cells begins.
    pub fn column_for(&self, len: usize) -> usize {
        let free = self.width().saturating_sub(len);
        match self.align {
            Align::Left => self.left,
            Align::Center => self.left + free / 2,
            Align::Right => self.left + free,
        }
    }
}
