/*
 * mapper.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Mapping positions in normalized script text back to the document.
//!
//! A position reported against a block's normalized text goes through three
//! steps: the block's [`LineIndex`] turns it into a normalized offset, the
//! block's [`TransformLog`] traces that to an offset in the raw script text,
//! and adding the block's source start gives a document offset that the
//! document's [`LineIndex`] turns back into a line and column.

use scriptmap_source_map::{LineIndex, Location, SourceMapError, TransformLog};

use crate::diagnostic::{Diagnostic, Fix};
use crate::error::{Error, Result};

/// A document position produced by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedLocation {
    pub location: Location,
    /// False when the position fell inside text inserted or rewritten by
    /// normalization and was clamped to the start of that edit.
    pub exact: bool,
}

/// How one block's normalized text relates to the document.
#[derive(Debug, Clone)]
pub struct BlockMapping {
    normalized: LineIndex,
    log: TransformLog,
    source_start: usize,
}

impl BlockMapping {
    pub fn new(normalized: impl Into<String>, log: TransformLog, source_start: usize) -> Self {
        BlockMapping {
            normalized: LineIndex::new(normalized),
            log,
            source_start,
        }
    }

    pub fn normalized_text(&self) -> &str {
        self.normalized.text()
    }

    pub fn log(&self) -> &TransformLog {
        &self.log
    }

    /// Document offset of the first raw character of the block.
    pub fn source_start(&self) -> usize {
        self.source_start
    }

    /// Map a normalized offset to a document offset, with its exactness.
    pub fn to_source_offset(&self, normalized_offset: usize) -> (usize, bool) {
        let original = self.log.to_original(normalized_offset);
        (self.source_start + original.offset(), original.is_exact())
    }

    /// Map a fix range in the normalized text to document offsets.
    ///
    /// Returns `None` when either end lands in rewritten text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::EditOutOfRange`] if the range is reversed,
    /// reaches past the normalized text, or splits a character.
    pub fn to_source_range(&self, range: [usize; 2]) -> Result<Option<[usize; 2]>> {
        let [start, end] = range;
        let text = self.normalized_text();
        if start > end || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(SourceMapError::EditOutOfRange {
                start,
                end,
                len: text.len(),
            }
            .into());
        }

        let start = self.log.to_original(start);
        let end = self.log.to_original_end(end);
        if start.is_exact() && end.is_exact() {
            Ok(Some([
                self.source_start + start.offset(),
                self.source_start + end.offset(),
            ]))
        } else {
            Ok(None)
        }
    }
}

/// The document's line index plus one [`BlockMapping`] per script block.
#[derive(Debug, Clone)]
pub struct DocumentMapper {
    source: LineIndex,
    blocks: Vec<BlockMapping>,
}

impl DocumentMapper {
    pub fn new(source: LineIndex) -> Self {
        DocumentMapper {
            source,
            blocks: Vec::new(),
        }
    }

    /// Add a block and return its index.
    pub fn push_block(&mut self, block: BlockMapping) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    pub fn source(&self) -> &LineIndex {
        &self.source
    }

    pub fn block(&self, index: usize) -> Result<&BlockMapping> {
        self.blocks.get(index).ok_or(Error::NoSuchBlock {
            index,
            count: self.blocks.len(),
        })
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Translate a 1-based (line, column) in a block's normalized text into
    /// a document location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchBlock`] for an unknown block and a source-map
    /// error when the position does not exist in the normalized text.
    pub fn to_source_position(
        &self,
        block: usize,
        line: usize,
        column: usize,
    ) -> Result<MappedLocation> {
        let mapping = self.block(block)?;
        let normalized_offset = mapping.normalized.offset_of(line, column)?;
        self.offset_to_location(mapping, normalized_offset)
    }

    fn offset_to_location(
        &self,
        mapping: &BlockMapping,
        normalized_offset: usize,
    ) -> Result<MappedLocation> {
        let (offset, exact) = mapping.to_source_offset(normalized_offset);
        Ok(MappedLocation {
            location: self.source.location_of(offset)?,
            exact,
        })
    }

    /// Rewrite a diagnostic reported against a block into document
    /// coordinates.
    ///
    /// Every field other than the positions is kept. A fix is kept only if
    /// both ends of its range map exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist or the diagnostic's
    /// position is outside the normalized text.
    pub fn remap(&self, block: usize, diagnostic: &Diagnostic) -> Result<Diagnostic> {
        let mapping = self.block(block)?;
        let mut remapped = diagnostic.clone();

        let start = self.to_source_position(block, diagnostic.line, diagnostic.column)?;
        remapped.line = start.location.line;
        remapped.column = start.location.column;

        if let (Some(end_line), Some(end_column)) = (diagnostic.end_line, diagnostic.end_column) {
            let end = self.to_source_position(block, end_line, end_column)?;
            remapped.end_line = Some(end.location.line);
            remapped.end_column = Some(end.location.column);
        }

        remapped.fix = match &diagnostic.fix {
            Some(fix) => match mapping.to_source_range(fix.range)? {
                Some(range) => Some(Fix {
                    range,
                    text: fix.text.clone(),
                }),
                None => {
                    tracing::debug!(
                        range = ?fix.range,
                        "Dropping fix that touches rewritten text"
                    );
                    None
                }
            },
            None => None,
        };

        Ok(remapped)
    }
}
