//! Tagged XML input.

mod options;
mod xml;

pub use options::{ErrorMode, ParseOptions};
pub use xml::{strip_bom, XmlParser};
