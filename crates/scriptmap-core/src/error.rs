/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for the extraction pipeline.

use scriptmap_markup::MarkupError;
use scriptmap_source_map::SourceMapError;
use thiserror::Error;

/// Result type alias for scriptmap-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while preparing or remapping a document.
#[derive(Debug, Error)]
pub enum Error {
    /// The document could not be parsed (XML mode only).
    #[error("Parsing error: {0}")]
    Parse(#[from] MarkupError),

    /// A position or edit did not fit the text it was applied to.
    #[error(transparent)]
    SourceMap(#[from] SourceMapError),

    /// The settings could not be compiled.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Diagnostics were supplied for a block that does not exist.
    #[error("no script block {index} (document has {count})")]
    NoSuchBlock { index: usize, count: usize },
}

/// Errors in user-supplied settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// An indent descriptor that is not `auto`, an integer, or `[+-]N`.
    #[error("invalid indent `{0}`: expected \"auto\", a non-negative integer, or \"+N\"/\"-N\"")]
    InvalidIndent(String),

    /// A `/regex/flags` MIME pattern that does not compile.
    #[error("invalid MIME type pattern `{pattern}`: {message}")]
    InvalidMimePattern { pattern: String, message: String },

    /// A tab width of zero.
    #[error("tab-width must be at least 1")]
    ZeroTabWidth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = Error::from(MarkupError::UnescapedLessThan { position: 3 });
        insta::assert_snapshot!(err.to_string(), @"Parsing error: Unexpected token <");
    }

    #[test]
    fn test_settings_error_message() {
        let err = Error::from(SettingsError::InvalidIndent("tabs".to_string()));
        insta::assert_snapshot!(
            err.to_string(),
            @r#"invalid indent `tabs`: expected "auto", a non-negative integer, or "+N"/"-N""#
        );
    }
}
