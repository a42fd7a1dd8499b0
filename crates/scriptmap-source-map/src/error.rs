/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for position lookups and edit logs.

use thiserror::Error;

/// Result type alias for scriptmap-source-map operations.
pub type Result<T> = std::result::Result<T, SourceMapError>;

/// Errors raised when a query falls outside a buffer or an edit log is malformed.
///
/// All of these are contract violations by the caller: they are deterministic
/// functions of the input and are never worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceMapError {
    /// Offset is past the end of the buffer or not on a character boundary.
    #[error("offset {offset} is out of range for a buffer of {len} bytes")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// Line number is zero or past the last line.
    #[error("line {line} is out of range (buffer has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    /// Column number is zero or more than one past the end of the line.
    #[error("column {column} is out of range for line {line} (max column {max_column})")]
    ColumnOutOfRange {
        line: usize,
        column: usize,
        max_column: usize,
    },

    /// Edits overlap or are not sorted by their original start offset.
    #[error("edit at {start}..{end} overlaps or precedes the previous edit ending at {previous_end}")]
    OverlappingEdits {
        start: usize,
        end: usize,
        previous_end: usize,
    },

    /// An edit's range does not fit the text it is applied to.
    #[error("edit at {start}..{end} does not fit a buffer of {len} bytes")]
    EditOutOfRange { start: usize, end: usize, len: usize },
}
