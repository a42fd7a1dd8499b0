/*
 * line_index.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Offset-to-position index over a text buffer

use crate::error::{Result, SourceMapError};
use crate::types::Location;

/// A text buffer with an index of where each line begins
///
/// Scans the content once to record line starts. `\n`, `\r\n` and a lone
/// `\r` all end a line; a CRLF pair is one logical newline. Offset lookups
/// binary-search the line starts, then count characters within the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    text: String,

    /// Byte offset of the first character of each line; always starts with 0
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index for `text`.
    ///
    /// # Example
    ///
    /// ```
    /// use scriptmap_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("line 1\r\nline 2\nline 3");
    /// assert_eq!(index.line_count(), 3);
    /// ```
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let bytes = text.as_bytes();

        let mut line_starts = vec![0];
        for pos in memchr::memchr2_iter(b'\n', b'\r', bytes) {
            // The '\n' of a CRLF pair records the line start.
            if bytes[pos] == b'\r' && bytes.get(pos + 1) == Some(&b'\n') {
                continue;
            }
            line_starts.push(pos + 1);
        }

        LineIndex { text, line_starts }
    }

    /// The indexed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines. A trailing newline opens a final empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a 1-based line and column.
    ///
    /// `offset == len()` is valid and addresses the end of the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::OffsetOutOfRange`] if the offset is past the
    /// end of the text or splits a multi-byte character.
    ///
    /// # Example
    ///
    /// ```
    /// use scriptmap_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("hello\nworld");
    /// let loc = index.location_of(6).unwrap();
    /// assert_eq!(loc.line, 2);
    /// assert_eq!(loc.column, 1);
    /// ```
    pub fn location_of(&self, offset: usize) -> Result<Location> {
        if offset > self.text.len() || !self.text.is_char_boundary(offset) {
            return Err(SourceMapError::OffsetOutOfRange {
                offset,
                len: self.text.len(),
            });
        }

        // line_starts[0] == 0 <= offset, so at least one start qualifies
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];

        let column = self.text[line_start..offset]
            .chars()
            .filter(|&ch| ch != '\r')
            .count()
            + 1;

        Ok(Location {
            offset,
            line,
            column,
        })
    }

    /// Convert a 1-based line and column back to a byte offset.
    ///
    /// The column may be one past the last character of the line, which
    /// addresses the position just before the line terminator.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::LineOutOfRange`] or
    /// [`SourceMapError::ColumnOutOfRange`] when the position does not exist.
    pub fn offset_of(&self, line: usize, column: usize) -> Result<usize> {
        let content = self.line_text(line)?;
        let line_start = self.line_starts[line - 1];

        if column == 0 {
            return Err(self.column_error(line, column, content));
        }

        match content.char_indices().nth(column - 1) {
            Some((idx, _)) => Ok(line_start + idx),
            None if column - 1 == content.chars().count() => Ok(line_start + content.len()),
            None => Err(self.column_error(line, column, content)),
        }
    }

    /// Byte offset where a 1-based line begins.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::LineOutOfRange`] for a line that does not exist.
    pub fn line_start(&self, line: usize) -> Result<usize> {
        self.check_line(line)?;
        Ok(self.line_starts[line - 1])
    }

    /// The content of a 1-based line, without its terminator.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::LineOutOfRange`] for a line that does not exist.
    pub fn line_text(&self, line: usize) -> Result<&str> {
        self.check_line(line)?;

        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len());

        let raw = &self.text[start..end];
        let content = raw
            .strip_suffix("\r\n")
            .or_else(|| raw.strip_suffix('\n'))
            .or_else(|| raw.strip_suffix('\r'))
            .unwrap_or(raw);
        Ok(content)
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line == 0 || line > self.line_starts.len() {
            return Err(SourceMapError::LineOutOfRange {
                line,
                line_count: self.line_starts.len(),
            });
        }
        Ok(())
    }

    fn column_error(&self, line: usize, column: usize, content: &str) -> SourceMapError {
        SourceMapError::ColumnOutOfRange {
            line,
            column,
            max_column: content.chars().count() + 1,
        }
    }
}
