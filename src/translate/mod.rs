//! Braille translation.
//!
//! Text is collected into [`TextSpan`]s per block, run through a
//! [`BrailleTable`], split back per span with the table's index map and
//! attached to the document as `Brl` nodes. Math elements are converted
//! through a [`MathNode`] tree with a [`MathCode`].

mod emphasis;
mod math;
mod normalize;
mod probe;
mod span;
mod table;
mod translator;

pub use emphasis::{apply_typeform, PASSAGE_WORDS};
pub use math::{mathml_equivalent, MathCode, MathNode};
pub use normalize::{NormalizeOptions, Normalizer};
pub use probe::{TableProbe, DEFAULT_PROBE_ATTEMPTS};
pub use span::{Attach, ContentType, TextSpan};
pub use table::{
    ascii_to_dots, ascii_to_unicode, dots_to_ascii, unicode_to_ascii, BrailleTable,
    ComputerBraille, TableOutput, TableRegistry, UebGrade1, ASCII_BRAILLE, COMPUTER_BRAILLE,
    UEB_GRADE1,
};
pub use translator::{Translation, Translator};
