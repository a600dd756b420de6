//! Spacing requested but not yet applied.

use std::collections::BTreeSet;

use crate::model::NodeId;

/// Vertical spacing and page breaks waiting for the next line.
///
/// All requests merge with "at least" semantics: the largest request wins,
/// requests never add up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSpacing {
    lines_before: usize,
    lines_after: usize,
    explicit_pages: usize,
    requesters: BTreeSet<NodeId>,
    implicit_page: bool,
}

/// Spacing taken out of [`PendingSpacing`] to be applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacing {
    pub blank_lines: usize,
    pub explicit_pages: usize,
    /// The page was opened by overflow; leading blank lines are dropped
    pub implicit_page: bool,
}

impl PendingSpacing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_at_least_lines_before(&mut self, lines: usize) {
        self.lines_before = self.lines_before.max(lines);
    }

    pub fn add_at_least_lines_after(&mut self, lines: usize) {
        self.lines_after = self.lines_after.max(lines);
    }

    /// Request `pages` new pages on behalf of `node`. Repeated requests
    /// from the same node are ignored.
    pub fn request_pages(&mut self, node: NodeId, pages: usize) {
        if pages == 0 || !self.requesters.insert(node) {
            return;
        }
        self.explicit_pages = self.explicit_pages.max(pages);
    }

    /// Mark that the current page overflowed.
    pub fn request_implicit_page(&mut self) {
        self.implicit_page = true;
    }

    pub fn lines_before(&self) -> usize {
        self.lines_before
    }

    pub fn lines_after(&self) -> usize {
        self.lines_after
    }

    pub fn explicit_pages(&self) -> usize {
        self.explicit_pages
    }

    pub fn implicit_page(&self) -> bool {
        self.implicit_page
    }

    /// Blank lines to leave: the larger of before and after.
    pub fn blank_lines(&self) -> usize {
        self.lines_before.max(self.lines_after)
    }

    pub fn is_empty(&self) -> bool {
        self.blank_lines() == 0 && self.explicit_pages == 0 && !self.implicit_page
    }

    /// Take everything pending, leaving nothing behind.
    pub fn take(&mut self) -> Spacing {
        let taken = Spacing {
            blank_lines: self.blank_lines(),
            explicit_pages: self.explicit_pages,
            implicit_page: self.implicit_page,
        };
        *self = Self::default();
        taken
    }

    /// Put taken spacing back (merging with anything requested since).
    pub fn restore(&mut self, spacing: Spacing) {
        self.add_at_least_lines_before(spacing.blank_lines);
        self.explicit_pages = self.explicit_pages.max(spacing.explicit_pages);
        self.implicit_page |= spacing.implicit_page;
    }
}
