//! Error types for brlpage library.

use std::io;
use thiserror::Error;

/// Result type alias for brlpage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while translating or formatting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not well-formed XML.
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// Error reading or writing JSON (configuration, page dumps).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine configuration is malformed or inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A node does not have the shape a rule requires and no fallback exists.
    #[error("{message}\nat node: {node}")]
    Structural {
        /// What was expected
        message: String,
        /// Serialized form of the offending node
        node: String,
    },

    /// An internal contract was broken. Never retried.
    #[error("Invariant violated: {message}\nat node: {node}")]
    Invariant {
        /// Which invariant failed
        message: String,
        /// Serialized form of the offending node
        node: String,
    },

    /// A page grid was addressed outside its bounds.
    #[error("Cell ({x}, {y}) is outside the {width}x{height} page grid")]
    GridOutOfBounds {
        /// Requested column
        x: usize,
        /// Requested line
        y: usize,
        /// Grid width in cells
        width: usize,
        /// Grid height in lines
        height: usize,
    },

    /// No braille table is registered under this id.
    #[error("Unknown braille table: {0}")]
    UnknownTable(String),

    /// The braille table engine rejected its input.
    #[error("Translation error: {0}")]
    Translation(String),

    /// The table engine was interrupted (e.g. by a configuration reload).
    #[error("Translation was interrupted")]
    Interrupted,

    /// Table probing kept getting interrupted.
    #[error("Unable to measure table after {attempts} attempts, please try again\nat node: {node}")]
    ProbeFailed {
        /// Number of attempts made
        attempts: u32,
        /// Serialized form of the table
        node: String,
    },

    /// ASCII-math or MathML input could not be read.
    #[error("Math syntax error: {0}")]
    MathSyntax(String),

    /// Error while writing output (BRF, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a structural error carrying the node's serialized form.
    pub fn structural(message: impl Into<String>, node: impl Into<String>) -> Self {
        Error::Structural {
            message: message.into(),
            node: node.into(),
        }
    }

    /// Build an invariant violation carrying the node's serialized form.
    pub fn invariant(message: impl Into<String>, node: impl Into<String>) -> Self {
        Error::Invariant {
            message: message.into(),
            node: node.into(),
        }
    }

    /// Whether the failure is transient and the operation may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::GridOutOfBounds {
            x: 40,
            y: 2,
            width: 40,
            height: 25,
        };
        assert_eq!(
            err.to_string(),
            "Cell (40, 2) is outside the 40x25 page grid"
        );

        let err = Error::structural("Margin level is not a number", "<block/>");
        assert!(err.to_string().contains("<block/>"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_transient() {
        assert!(Error::Interrupted.is_transient());
        assert!(!Error::invariant("x", "y").is_transient());
    }
}
