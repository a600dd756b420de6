//! Output options.

use serde::{Deserialize, Serialize};

/// Braille character set of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Encoding {
    /// North American ASCII braille
    #[default]
    Ascii,
    /// Unicode braille patterns (U+2800 block), UTF-8 encoded
    Unicode,
}

/// Line terminator written after every braille line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineEnding {
    #[default]
    Crlf,
    Lf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Options for BRF output.
#[derive(Debug, Clone)]
pub struct BrfOptions {
    /// Character set
    pub encoding: Encoding,

    /// Line terminator
    pub line_ending: LineEnding,

    /// Pad to an even number of pages for duplex embossing
    pub interpoint: bool,

    /// Write ASCII braille in upper case
    pub uppercase: bool,
}

impl BrfOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character set.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the line terminator.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Enable or disable interpoint padding.
    pub fn with_interpoint(mut self, interpoint: bool) -> Self {
        self.interpoint = interpoint;
        self
    }

    /// Write ASCII braille in upper or lower case.
    pub fn with_uppercase(mut self, uppercase: bool) -> Self {
        self.uppercase = uppercase;
        self
    }
}

impl Default for BrfOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Ascii,
            line_ending: LineEnding::Crlf,
            interpoint: false,
            uppercase: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = BrfOptions::new()
            .with_encoding(Encoding::Unicode)
            .with_line_ending(LineEnding::Lf)
            .with_interpoint(true);
        assert_eq!(options.encoding, Encoding::Unicode);
        assert_eq!(options.line_ending.as_str(), "\n");
        assert!(options.interpoint);
        assert!(options.uppercase);
    }
}
