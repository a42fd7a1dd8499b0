/*
 * indent.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Indentation normalization for extracted script text.
//!
//! Script bodies usually carry the indentation of the surrounding markup.
//! [`normalize`] rewrites the leading whitespace of every non-blank line
//! according to an [`IndentPolicy`] and records each change as an [`Edit`],
//! so positions in the normalized text can be traced back to the raw text.
//!
//! Each line's change is a single edit anchored at the line start: an
//! insertion of spaces when the line grows, or a removal of leading
//! whitespace when it shrinks. A tab that straddles the cut is replaced by
//! spaces covering the remainder. Blank lines are never touched.

use scriptmap_source_map::{Edit, LineIndex, TransformLog};

use crate::error::Result;
use crate::settings::IndentPolicy;

/// The result of normalizing one script block.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Text handed to the analyzer.
    pub text: String,
    /// Markup edits merged with indentation edits, relative to the raw text.
    pub log: TransformLog,
    /// Lines that would have needed a negative indentation.
    pub bad_lines: Vec<BadIndent>,
}

/// A raw line whose target indentation was below zero and was clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadIndent {
    /// 1-based line number within the raw text.
    pub line: usize,
    /// Byte offset of the line start within the raw text.
    pub offset: usize,
}

/// Leading whitespace of one non-blank line.
#[derive(Debug)]
struct LineIndent {
    number: usize,
    start: usize,
    width: usize,
    /// Byte offset after each leading whitespace character, with the
    /// cumulative width up to that point.
    stops: Vec<(usize, usize)>,
}

/// Rewrite the leading whitespace of `raw` according to `policy`.
///
/// `markup_edits` are the sorted, raw-relative edits that strip non-script
/// markup (see [`crate::extract::ScriptBlock::markup_edits`]). They are
/// applied as well and merged into the returned log. Tabs count
/// `tab_width` columns.
///
/// # Errors
///
/// Returns an error if the markup edits overlap or do not fit `raw`.
///
/// # Example
///
/// ```rust
/// use scriptmap_core::indent::normalize;
/// use scriptmap_core::IndentPolicy;
///
/// let normalized = normalize("\n    a();\n      b();\n", &[], IndentPolicy::Auto, 1).unwrap();
/// assert_eq!(normalized.text, "\na();\n  b();\n");
/// ```
pub fn normalize(
    raw: &str,
    markup_edits: &[Edit],
    policy: IndentPolicy,
    tab_width: usize,
) -> Result<Normalized> {
    let lines = measure_lines(raw, markup_edits, tab_width)?;

    let mut edits = markup_edits.to_vec();
    let mut bad_lines = Vec::new();

    if let Some(first) = lines.first() {
        let min = lines.iter().map(|l| l.width).min().unwrap_or(first.width);
        let shift = match policy {
            IndentPolicy::Auto => -(min as isize),
            IndentPolicy::Relative(k) => k - min as isize,
            IndentPolicy::Absolute(n) => n as isize - first.width as isize,
        };

        for line in &lines {
            let mut target = line.width as isize + shift;
            if target < 0 {
                tracing::debug!(line = line.number, target, "Clamping indentation to zero");
                bad_lines.push(BadIndent {
                    line: line.number,
                    offset: line.start,
                });
                target = 0;
            }
            if let Some(edit) = reindent(line, target as usize) {
                edits.push(edit);
            }
        }
    }

    edits.sort_by_key(|edit| (edit.range.start, edit.range.end));
    let log = TransformLog::new(edits)?;
    let text = log.apply(raw)?;

    Ok(Normalized {
        text,
        log,
        bad_lines,
    })
}

/// The edit that brings `line` to `target` columns, if any.
fn reindent(line: &LineIndent, target: usize) -> Option<Edit> {
    if target > line.width {
        return Some(Edit::insert(line.start, " ".repeat(target - line.width)));
    }
    if target == line.width {
        return None;
    }

    let remove = line.width - target;
    let &(end, cumulative) = line.stops.iter().find(|(_, cum)| *cum >= remove)?;
    Some(Edit::new(line.start..end, " ".repeat(cumulative - remove)))
}

/// Measure the leading whitespace of every non-blank line.
///
/// Lines that begin inside a markup edit (a multi-line comment, say) are
/// skipped, and measuring stops where markup begins.
fn measure_lines(raw: &str, markup_edits: &[Edit], tab_width: usize) -> Result<Vec<LineIndent>> {
    let index = LineIndex::new(raw);
    let mut lines = Vec::new();

    for number in 1..=index.line_count() {
        let start = index.line_start(number)?;
        let end = start + index.line_text(number)?.len();

        if markup_edits
            .iter()
            .any(|edit| edit.range.start < start && start < edit.range.end)
        {
            continue;
        }

        let on_line: Vec<&Edit> = markup_edits
            .iter()
            .filter(|edit| edit.range.start >= start && edit.range.start < end)
            .collect();
        if is_blank(raw, start, end, &on_line) {
            continue;
        }

        let limit = on_line.first().map_or(end, |edit| edit.range.start);
        let mut width = 0;
        let mut stops = Vec::new();
        for (i, ch) in raw[start..limit].char_indices() {
            width += match ch {
                ' ' => 1,
                '\t' => tab_width,
                _ => break,
            };
            stops.push((start + i + ch.len_utf8(), width));
        }

        lines.push(LineIndent {
            number,
            start,
            width,
            stops,
        });
    }

    Ok(lines)
}

/// True if the line shows only whitespace once markup is replaced.
fn is_blank(raw: &str, start: usize, end: usize, on_line: &[&Edit]) -> bool {
    let mut cursor = start;
    for edit in on_line {
        if !raw[cursor..edit.range.start].trim().is_empty() || !edit.replacement.trim().is_empty() {
            return false;
        }
        cursor = edit.range.end.min(end);
    }
    raw[cursor..end].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn widths(text: &str) -> Vec<usize> {
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start().len())
            .collect()
    }

    const SAMPLE: &str = "\n    a();\n      b();\n      c();\n";

    #[test]
    fn test_auto_strips_common_indent() {
        let result = normalize(SAMPLE, &[], IndentPolicy::Auto, 1).unwrap();
        assert_eq!(widths(&result.text), vec![0, 2, 2]);
        assert!(result.bad_lines.is_empty());
    }

    #[test]
    fn test_absolute_sets_first_line() {
        let result = normalize(SAMPLE, &[], IndentPolicy::Absolute(2), 1).unwrap();
        assert_eq!(widths(&result.text), vec![2, 4, 4]);
        assert_eq!(result.text, "\n  a();\n    b();\n    c();\n");
    }

    #[test]
    fn test_relative_shifts_auto() {
        let result = normalize(SAMPLE, &[], IndentPolicy::Relative(2), 1).unwrap();
        assert_eq!(widths(&result.text), vec![2, 4, 4]);
    }

    #[test]
    fn test_absolute_uses_first_line_not_minimum() {
        let raw = "      a();\n    b();";
        let result = normalize(raw, &[], IndentPolicy::Absolute(4), 1).unwrap();
        assert_eq!(result.text, "    a();\n  b();");
    }

    #[test]
    fn test_negative_target_clamps_to_zero() {
        let raw = "\n    a();\n  b();\n    c();";
        let result = normalize(raw, &[], IndentPolicy::Absolute(0), 1).unwrap();

        assert_eq!(result.text, "\na();\nb();\nc();");
        assert_eq!(result.bad_lines, vec![BadIndent { line: 3, offset: 10 }]);
    }

    #[test]
    fn test_negative_relative_clamps_outdented_lines() {
        let raw = "  a();\n    b();";
        let result = normalize(raw, &[], IndentPolicy::Relative(-1), 1).unwrap();

        assert_eq!(result.text, "a();\n b();");
        assert_eq!(result.bad_lines, vec![BadIndent { line: 1, offset: 0 }]);
    }

    #[test]
    fn test_blank_lines_untouched() {
        let raw = "    a();\n\n  \n    b();";
        let result = normalize(raw, &[], IndentPolicy::Auto, 1).unwrap();
        assert_eq!(result.text, "a();\n\n  \nb();");
    }

    #[test]
    fn test_tab_straddling_cut_becomes_spaces() {
        let raw = "\t\ta();\n  b();";
        let result = normalize(raw, &[], IndentPolicy::Auto, 4).unwrap();

        assert_eq!(result.text, "  \ta();\nb();");
        assert_eq!(result.log.edits()[0], Edit::new(0..1, "  "));
    }

    #[test]
    fn test_tabs_default_to_one_column() {
        let raw = "\t\ta();\n\tb();";
        let result = normalize(raw, &[], IndentPolicy::Auto, 1).unwrap();
        assert_eq!(result.text, "\ta();\nb();");
    }

    #[test]
    fn test_crlf_lines() {
        let raw = "\r\n    a();\r\n      b();\r\n";
        let result = normalize(raw, &[], IndentPolicy::Auto, 1).unwrap();
        assert_eq!(result.text, "\r\na();\r\n  b();\r\n");
    }

    #[test]
    fn test_normalizing_twice_is_a_no_op() {
        let auto = normalize(SAMPLE, &[], IndentPolicy::Auto, 1).unwrap();
        let again = normalize(&auto.text, &[], IndentPolicy::Auto, 1).unwrap();
        assert!(again.log.is_empty());
        assert_eq!(again.text, auto.text);

        for policy in [IndentPolicy::Absolute(3), IndentPolicy::Relative(2)] {
            let once = normalize(SAMPLE, &[], policy, 1).unwrap();
            let twice = normalize(&once.text, &[], IndentPolicy::Auto, 1).unwrap();
            assert_eq!(twice.text, auto.text, "{policy}");
        }
    }

    #[test]
    fn test_log_reproduces_text_and_maps_back() {
        let raw = "\n    let x = 1;\n      x += 2;\n";
        let result = normalize(raw, &[], IndentPolicy::Absolute(1), 1).unwrap();

        assert_eq!(result.log.apply(raw).unwrap(), result.text);

        let normalized = result.text.find("x +=").unwrap();
        let original = result.log.to_original(normalized);
        assert!(original.is_exact());
        assert_eq!(original.offset(), raw.find("x +=").unwrap());
    }

    #[test]
    fn test_markup_edits_are_merged() {
        let raw = "<![CDATA[\n    foo();\n    bar();\n]]>";
        let close = raw.len() - 3;
        let markup = vec![Edit::delete(0..9), Edit::delete(close..raw.len())];

        let result = normalize(raw, &markup, IndentPolicy::Auto, 1).unwrap();
        assert_eq!(result.text, "\nfoo();\nbar();\n");
        assert_eq!(result.log.len(), 4);
    }

    #[test]
    fn test_line_inside_markup_is_skipped() {
        let raw = "    a();<!-- note\nstill comment -->\n    b();";
        let open = raw.find("<!--").unwrap();
        let close = raw.find("-->").unwrap() + 3;
        let markup = vec![Edit::delete(open..close)];

        let result = normalize(raw, &markup, IndentPolicy::Auto, 1).unwrap();
        assert_eq!(result.text, "a();\nb();");
    }

    #[test]
    fn test_markup_only_line_is_blank() {
        let raw = "  <!-- c -->\n    a();";
        let markup = vec![Edit::delete(2..12)];

        let result = normalize(raw, &markup, IndentPolicy::Auto, 1).unwrap();
        assert_eq!(result.text, "  \na();");
    }

    #[test]
    fn test_entity_at_line_start_stops_measure() {
        let raw = "  &lt;x\n    y";
        let markup = vec![Edit::new(2..6, "<")];

        let result = normalize(raw, &markup, IndentPolicy::Auto, 1).unwrap();
        assert_eq!(result.text, "<x\n  y");
    }
}
