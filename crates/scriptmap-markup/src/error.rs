/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for markup parsing with source positions.

use thiserror::Error;

/// Result type alias for scriptmap-markup operations.
pub type Result<T> = std::result::Result<T, MarkupError>;

/// Errors that can occur while parsing a document.
///
/// The display text is the bare message; use [`MarkupError::position`] to get
/// the byte offset it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// XML syntax error reported by quick-xml.
    #[error("{message}")]
    Syntax { message: String, position: usize },

    /// A `<` in character data that does not open a tag.
    #[error("Unexpected token <")]
    UnescapedLessThan { position: usize },

    /// A tag whose name is not a valid XML name.
    #[error("Invalid element name `{name}`")]
    InvalidName { name: String, position: usize },

    /// End tag that does not match the innermost open element.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        position: usize,
    },

    /// End tag with no open element.
    #[error("Unexpected closing tag </{name}>")]
    UnexpectedEndTag { name: String, position: usize },

    /// Input ended while an element was still open.
    #[error("Unexpected end of input, expected closing tag </{name}>")]
    UnclosedElement { name: String, position: usize },

    /// The HTML grammar could not be loaded or produced no tree.
    #[error("HTML parser unavailable: {message}")]
    Grammar { message: String },
}

impl MarkupError {
    /// Byte offset in the source the error refers to.
    pub fn position(&self) -> Option<usize> {
        match self {
            MarkupError::Syntax { position, .. }
            | MarkupError::UnescapedLessThan { position }
            | MarkupError::InvalidName { position, .. }
            | MarkupError::MismatchedEndTag { position, .. }
            | MarkupError::UnexpectedEndTag { position, .. }
            | MarkupError::UnclosedElement { position, .. } => Some(*position),
            MarkupError::Grammar { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_omits_position() {
        let err = MarkupError::MismatchedEndTag {
            expected: "script".to_string(),
            found: "body".to_string(),
            position: 40,
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"Mismatched end tag: expected </script>, found </body>"
        );
        assert_eq!(err.position(), Some(40));
    }

    #[test]
    fn test_grammar_error_has_no_position() {
        let err = MarkupError::Grammar {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.position(), None);
    }
}
