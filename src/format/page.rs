//! Braille pages and their lifecycle.

use serde::Serialize;

use super::grid::PageGrid;
use super::numbering::PageNumbering;
use crate::error::{Error, Result};

/// Lifecycle of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PageState {
    /// Content is being placed
    Collecting,
    /// Pending spacing is being applied before the next line
    ResolvingSpacing,
    /// Finished and immutable
    Committed,
}

/// One braille page.
#[derive(Debug, Clone)]
pub struct BraillePage {
    /// Position in the output, from 0
    pub index: usize,
    grid: PageGrid,
    numbering: PageNumbering,
    braille_label: Option<String>,
    print_label: Option<String>,
    state: PageState,
}

impl BraillePage {
    pub fn new(index: usize, width: usize, height: usize, numbering: PageNumbering) -> Self {
        Self {
            index,
            grid: PageGrid::new(width, height),
            numbering,
            braille_label: None,
            print_label: None,
            state: PageState::Collecting,
        }
    }

    pub fn grid(&self) -> &PageGrid {
        &self.grid
    }

    /// Mutable grid; committed pages are immutable.
    pub fn grid_mut(&mut self) -> Result<&mut PageGrid> {
        if self.state == PageState::Committed {
            return Err(Error::invariant(
                "write to a committed page",
                format!("page {}", self.index + 1),
            ));
        }
        Ok(&mut self.grid)
    }

    pub fn numbering(&self) -> &PageNumbering {
        &self.numbering
    }

    pub fn braille_label(&self) -> Option<&str> {
        self.braille_label.as_deref()
    }

    pub fn print_label(&self) -> Option<&str> {
        self.print_label.as_deref()
    }

    pub(crate) fn set_labels(&mut self, braille: Option<String>, print: Option<String>) {
        self.braille_label = braille;
        self.print_label = print;
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// Whether this is the back of a sheet in interpoint output.
    pub fn is_verso(&self) -> bool {
        self.index % 2 == 1
    }

    /// No content besides page numbers.
    pub fn is_blank(&self) -> bool {
        self.grid.is_blank()
    }

    /// Collecting -> ResolvingSpacing.
    pub fn begin_spacing(&mut self) -> Result<()> {
        self.transition(PageState::Collecting, PageState::ResolvingSpacing)
    }

    /// ResolvingSpacing -> Collecting.
    pub fn end_spacing(&mut self) -> Result<()> {
        self.transition(PageState::ResolvingSpacing, PageState::Collecting)
    }

    /// Any open state -> Committed.
    pub fn commit(&mut self) -> Result<()> {
        if self.state == PageState::Committed {
            return Err(Error::invariant(
                "page committed twice",
                format!("page {}", self.index + 1),
            ));
        }
        self.state = PageState::Committed;
        Ok(())
    }

    fn transition(&mut self, from: PageState, to: PageState) -> Result<()> {
        if self.state != from {
            return Err(Error::invariant(
                format!("page state {:?} -> {:?} from {:?}", from, to, self.state),
                format!("page {}", self.index + 1),
            ));
        }
        self.state = to;
        Ok(())
    }

    /// Lines of the page, spaces for empty cells.
    pub fn lines(&self) -> Vec<String> {
        self.grid.lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::grid::{Cell, CellSource};

    #[test]
    fn test_state_machine() {
        let mut page = BraillePage::new(0, 10, 5, PageNumbering::new());
        assert_eq!(page.state(), PageState::Collecting);
        page.begin_spacing().unwrap();
        assert!(page.begin_spacing().is_err());
        page.end_spacing().unwrap();
        page.commit().unwrap();
        assert_eq!(page.state(), PageState::Committed);
        assert!(page.commit().is_err());
        assert!(matches!(page.grid_mut(), Err(Error::Invariant { .. })));
    }

    #[test]
    fn test_blank_and_verso() {
        let mut page = BraillePage::new(1, 10, 5, PageNumbering::new());
        assert!(page.is_verso());
        page.grid_mut()
            .unwrap()
            .set(8, 4, Cell::new('#', CellSource::PageNumber))
            .unwrap();
        assert!(page.is_blank());
    }
}
