/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Core types for source mapping

use serde::{Deserialize, Serialize};

/// A location in a text buffer
///
/// Lines and columns are 1-indexed to match what analyzers report. Columns
/// count characters, not bytes, and the `\r` of a CRLF pair never advances
/// the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of the buffer
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl Location {
    /// The location of the first character of a buffer.
    pub const START: Location = Location {
        offset: 0,
        line: 1,
        column: 1,
    };
}
