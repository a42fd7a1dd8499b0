/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reversible edit tracking for rewritten text
//!
//! A [`TransformLog`] records how an original buffer was turned into a
//! transformed one as a sorted list of non-overlapping [`Edit`]s. Offsets in
//! the transformed text can then be traced back to the original.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceMapError};

/// A single substitution: replace `range` of the original text with `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Byte range in the original text
    pub range: Range<usize>,
    /// Text that takes the place of the range
    pub replacement: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Edit {
            range,
            replacement: replacement.into(),
        }
    }

    /// Insert `text` before the original character at `at`.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Edit::new(at..at, text)
    }

    /// Remove `range` from the original text.
    pub fn delete(range: Range<usize>) -> Self {
        Edit::new(range, String::new())
    }

    /// True if this edit adds text without consuming any original text.
    pub fn is_insertion(&self) -> bool {
        self.range.is_empty() && !self.replacement.is_empty()
    }
}

/// Result of tracing a transformed offset back to the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginalOffset {
    /// The offset corresponds to exactly this original offset.
    Exact(usize),
    /// The offset fell inside text produced by an edit with no matching
    /// original character; it is clamped to the start of that edit's range.
    Clamped(usize),
}

impl OriginalOffset {
    pub fn offset(self) -> usize {
        match self {
            OriginalOffset::Exact(offset) | OriginalOffset::Clamped(offset) => offset,
        }
    }

    pub fn is_exact(self) -> bool {
        matches!(self, OriginalOffset::Exact(_))
    }
}

/// Where an edit's replacement landed in the transformed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    transformed_start: usize,
    transformed_end: usize,
    /// Original bytes consumed by all earlier edits
    removed_before: usize,
    /// Replacement bytes produced by all earlier edits
    inserted_before: usize,
}

/// An immutable, sorted list of non-overlapping edits
///
/// Invariant: applying the edits in order to the original text
/// deterministically yields the transformed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformLog {
    edits: Vec<Edit>,
    spans: Vec<Span>,
    removed_total: usize,
    inserted_total: usize,
}

impl TransformLog {
    /// Build a log from edits sorted by original start offset.
    ///
    /// Several zero-length insertions may share an offset, and an insertion
    /// may sit at the start of a following edit's range, but ranges must not
    /// overlap.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::OverlappingEdits`] if the edits are unsorted
    /// or overlap.
    pub fn new(edits: Vec<Edit>) -> Result<Self> {
        let mut spans = Vec::with_capacity(edits.len());
        let mut removed = 0usize;
        let mut inserted = 0usize;
        let mut previous_end = 0usize;

        for edit in &edits {
            let Range { start, end } = edit.range.clone();
            if start < previous_end || end < start {
                return Err(SourceMapError::OverlappingEdits {
                    start,
                    end,
                    previous_end,
                });
            }
            previous_end = end;

            let transformed_start = start + inserted - removed;
            spans.push(Span {
                transformed_start,
                transformed_end: transformed_start + edit.replacement.len(),
                removed_before: removed,
                inserted_before: inserted,
            });

            removed += end - start;
            inserted += edit.replacement.len();
        }

        Ok(TransformLog {
            edits,
            spans,
            removed_total: removed,
            inserted_total: inserted,
        })
    }

    /// A log with no edits; maps every offset to itself.
    pub fn identity() -> Self {
        TransformLog::default()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit to `original`, producing the transformed text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceMapError::EditOutOfRange`] if an edit reaches past the
    /// end of `original` or splits a multi-byte character.
    pub fn apply(&self, original: &str) -> Result<String> {
        let mut out = String::with_capacity(original.len() + self.inserted_total);
        let mut cursor = 0;

        for edit in &self.edits {
            let Range { start, end } = edit.range.clone();
            if end > original.len()
                || !original.is_char_boundary(start)
                || !original.is_char_boundary(end)
            {
                return Err(SourceMapError::EditOutOfRange {
                    start,
                    end,
                    len: original.len(),
                });
            }
            out.push_str(&original[cursor..start]);
            out.push_str(&edit.replacement);
            cursor = end;
        }
        out.push_str(&original[cursor..]);

        Ok(out)
    }

    /// Trace an offset in the transformed text back to the original text.
    ///
    /// Offsets between edits shift by the net length change of all earlier
    /// edits. An offset inside an edit's replacement has no single original
    /// character: the first byte of a replacement that consumed original text
    /// maps exactly to the start of its range, everything else is clamped to
    /// that start. The mapping is monotonic.
    pub fn to_original(&self, offset: usize) -> OriginalOffset {
        // First edit whose replacement ends after the offset
        let idx = self
            .spans
            .partition_point(|span| span.transformed_end <= offset);

        let Some(span) = self.spans.get(idx) else {
            return OriginalOffset::Exact(offset + self.removed_total - self.inserted_total);
        };

        if offset < span.transformed_start {
            return OriginalOffset::Exact(offset + span.removed_before - span.inserted_before);
        }

        let edit = &self.edits[idx];
        if offset == span.transformed_start && !edit.range.is_empty() {
            OriginalOffset::Exact(edit.range.start)
        } else {
            OriginalOffset::Clamped(edit.range.start)
        }
    }

    /// Trace the exclusive end of a transformed range back to the original.
    ///
    /// Same as [`to_original`](Self::to_original), except that the boundary
    /// just before an edit's replacement is exact even for a pure insertion:
    /// a range ending there covers none of the inserted text.
    pub fn to_original_end(&self, offset: usize) -> OriginalOffset {
        let idx = self
            .spans
            .partition_point(|span| span.transformed_end <= offset);

        match self.spans.get(idx) {
            Some(span) if offset == span.transformed_start => {
                OriginalOffset::Exact(self.edits[idx].range.start)
            }
            _ => self.to_original(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity() {
        let log = TransformLog::identity();
        assert!(log.is_empty());
        assert_eq!(log.apply("abc").unwrap(), "abc");
        assert_eq!(log.to_original(2), OriginalOffset::Exact(2));
    }

    #[test]
    fn test_deletions_shift_offsets() {
        let original = "    foo();\n    bar();";
        let log = TransformLog::new(vec![Edit::delete(0..4), Edit::delete(11..15)]).unwrap();
        assert_eq!(log.apply(original).unwrap(), "foo();\nbar();");

        // 'f' and 'b'
        assert_eq!(log.to_original(0), OriginalOffset::Exact(4));
        assert_eq!(log.to_original(7), OriginalOffset::Exact(15));
        // The newline between them
        assert_eq!(log.to_original(6), OriginalOffset::Exact(10));
        // End of text
        assert_eq!(log.to_original(13), OriginalOffset::Exact(21));
    }

    #[test]
    fn test_insertions_clamp_to_edit_start() {
        let original = "a\nb";
        let log = TransformLog::new(vec![Edit::insert(0, "  "), Edit::insert(2, "  ")]).unwrap();
        assert_eq!(log.apply(original).unwrap(), "  a\n  b");

        assert_eq!(log.to_original(0), OriginalOffset::Clamped(0));
        assert_eq!(log.to_original(1), OriginalOffset::Clamped(0));
        assert_eq!(log.to_original(2), OriginalOffset::Exact(0));
        assert_eq!(log.to_original(3), OriginalOffset::Exact(1));
        assert_eq!(log.to_original(4), OriginalOffset::Clamped(2));
        assert_eq!(log.to_original(6), OriginalOffset::Exact(2));
    }

    #[test]
    fn test_range_end_before_insertion_is_exact() {
        // "foo();\n" followed by an inserted indent on the next line
        let original = "foo();\nbar();";
        let log = TransformLog::new(vec![Edit::insert(0, "  "), Edit::insert(7, "  ")]).unwrap();
        assert_eq!(log.apply(original).unwrap(), "  foo();\n  bar();");

        assert_eq!(log.to_original(9), OriginalOffset::Clamped(7));
        assert_eq!(log.to_original_end(9), OriginalOffset::Exact(7));
        // Inside the inserted text it is still clamped
        assert_eq!(log.to_original_end(10), OriginalOffset::Clamped(7));
        // Elsewhere both agree
        assert_eq!(log.to_original_end(5), log.to_original(5));
        assert_eq!(log.to_original_end(17), OriginalOffset::Exact(13));
    }

    #[test]
    fn test_replacement_maps_first_byte_exactly() {
        let original = "a &lt; b";
        let log = TransformLog::new(vec![Edit::new(2..6, "<")]).unwrap();
        assert_eq!(log.apply(original).unwrap(), "a < b");

        assert_eq!(log.to_original(2), OriginalOffset::Exact(2));
        assert_eq!(log.to_original(3), OriginalOffset::Exact(6));
        assert_eq!(log.to_original(4), OriginalOffset::Exact(7));
    }

    #[test]
    fn test_widening_replacement() {
        // A tab rewritten as three spaces
        let log = TransformLog::new(vec![Edit::new(0..1, "   ")]).unwrap();
        assert_eq!(log.apply("\tx").unwrap(), "   x");
        assert_eq!(log.to_original(0), OriginalOffset::Exact(0));
        assert_eq!(log.to_original(1), OriginalOffset::Clamped(0));
        assert_eq!(log.to_original(2), OriginalOffset::Clamped(0));
        assert_eq!(log.to_original(3), OriginalOffset::Exact(1));
    }

    #[test]
    fn test_insertion_before_adjacent_deletion() {
        // Insert at 0, then delete 0..9 (a CDATA opener on the first line)
        let original = "<![CDATA[x]]>";
        let log = TransformLog::new(vec![
            Edit::insert(0, "  "),
            Edit::delete(0..9),
            Edit::delete(10..13),
        ])
        .unwrap();
        assert_eq!(log.apply(original).unwrap(), "  x");
        assert_eq!(log.to_original(2), OriginalOffset::Exact(9));
        assert_eq!(log.to_original(3), OriginalOffset::Exact(13));
    }

    #[test]
    fn test_rejects_overlapping_edits() {
        let err = TransformLog::new(vec![Edit::delete(0..4), Edit::delete(2..6)]).unwrap_err();
        assert_eq!(
            err,
            SourceMapError::OverlappingEdits {
                start: 2,
                end: 6,
                previous_end: 4
            }
        );
    }

    #[test]
    fn test_rejects_unsorted_edits() {
        assert!(TransformLog::new(vec![Edit::delete(5..6), Edit::delete(1..2)]).is_err());
    }

    #[test]
    fn test_apply_rejects_out_of_range_edit() {
        let log = TransformLog::new(vec![Edit::delete(2..10)]).unwrap();
        assert_eq!(
            log.apply("abc"),
            Err(SourceMapError::EditOutOfRange {
                start: 2,
                end: 10,
                len: 3
            })
        );
    }

    #[test]
    fn test_mapping_is_monotonic() {
        let original = "\t\tone\n    two\n\nthree &amp; four\n";
        let log = TransformLog::new(vec![
            Edit::new(0..2, " "),
            Edit::insert(6, "    "),
            Edit::delete(7..9),
            Edit::new(21..26, "&"),
            Edit::insert(32, "x"),
        ])
        .unwrap();
        let transformed = log.apply(original).unwrap();

        let mut previous = 0;
        for offset in 0..=transformed.len() {
            let mapped = log.to_original(offset).offset();
            assert!(
                mapped >= previous,
                "offset {offset} mapped to {mapped}, below {previous}"
            );
            assert!(mapped <= original.len());
            previous = mapped;
        }
    }

    #[test]
    fn test_exact_offsets_point_at_identical_characters() {
        let original = "  if (a &lt; b) {\n      go();\n  }";
        let log = TransformLog::new(vec![
            Edit::delete(0..2),
            Edit::new(8..12, "<"),
            Edit::delete(18..22),
            Edit::delete(30..32),
        ])
        .unwrap();
        let transformed = log.apply(original).unwrap();
        assert_eq!(transformed, "if (a < b) {\n  go();\n}");

        for (offset, ch) in transformed.char_indices() {
            if let OriginalOffset::Exact(orig) = log.to_original(offset) {
                if ch != '<' {
                    assert_eq!(original[orig..].chars().next(), Some(ch));
                }
            }
        }
    }
}
