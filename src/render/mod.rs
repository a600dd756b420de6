//! Output of formatted pages: BRF and a JSON page dump.

mod brf;
mod json;
mod options;
mod result;

pub use brf::{to_brf, to_brf_string, PAGE_BREAK};
pub use json::{to_json, CellDump, JsonFormat, PageDump};
pub use options::{BrfOptions, Encoding, LineEnding};
pub use result::FormatStats;
