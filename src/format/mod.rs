//! Page layout.
//!
//! The [`FormatEngine`] walks a translated document and places its braille
//! on fixed-size [`PageGrid`]s. Each page moves through
//! `Collecting -> ResolvingSpacing -> Committed`; spacing requested by
//! styles waits in [`PendingSpacing`] until the next line is placed.
//!
//! Tables and tables of contents have their own layouts in [`table`] and
//! [`toc`].

mod cursor;
mod engine;
mod grid;
mod numbering;
mod page;
mod segment;
mod spacing;
pub mod table;
pub mod toc;

pub use cursor::Cursor;
pub use engine::{
    brl_cells, fit, wrap, FormatEngine, RunCell, NUMBER_GAP, PAGE_TYPE_ATTR, RESTART_NUMBERING_ATTR,
};
pub use grid::{Cell, CellSource, PageGrid};
pub use numbering::{number_braille, PageNumberType, PageNumbering};
pub use page::{BraillePage, PageState};
pub use segment::SegmentInfo;
pub use spacing::{PendingSpacing, Spacing};
pub use table::{TableMetrics, TableType, TABLE_TYPE_ATTR, USER_TABLE_TYPE_ATTR};
