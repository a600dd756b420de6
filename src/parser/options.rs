//! Parsing options.

/// Options for reading tagged XML documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Drop translation output already present in the input
    pub strip_formatting: bool,

    /// Keep whitespace-only text between structural elements
    pub keep_whitespace: bool,

    /// Maximum element nesting depth (0 = unlimited)
    pub max_depth: usize,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (tolerate unknown entities and stray end tags).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Keep or drop existing translation output.
    pub fn with_strip_formatting(mut self, strip: bool) -> Self {
        self.strip_formatting = strip;
        self
    }

    /// Keep whitespace-only text nodes.
    pub fn keep_whitespace(mut self) -> Self {
        self.keep_whitespace = true;
        self
    }

    /// Limit nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            strip_formatting: false,
            keep_whitespace: false,
            max_depth: 512,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip invalid content and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .with_strip_formatting(true)
            .with_max_depth(32);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.strip_formatting);
        assert_eq!(options.max_depth, 32);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(!options.keep_whitespace);
    }
}
