/*
 * pipeline.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The per-document pipeline: preprocess, analyze, postprocess.
//!
//! [`preprocess`] parses a document, extracts its script blocks and
//! normalizes them. The normalized texts go to an [`Analyzer`], and
//! [`Preprocessed::postprocess`] maps the analyzer's diagnostics back into
//! document coordinates. [`lint`] runs all three steps.

use std::path::Path;

use scriptmap_markup::{DocumentMode, MarkupError};
use scriptmap_source_map::LineIndex;

use crate::diagnostic::{Diagnostic, Severity};
use crate::error::{Error, Result};
use crate::extract::{ScriptBlock, extract_blocks};
use crate::indent::{BadIndent, normalize};
use crate::mapper::{BlockMapping, DocumentMapper};
use crate::settings::{CompiledSettings, IndentPolicy};

pub const BAD_INDENT_MESSAGE: &str = "Bad line indentation.";

/// Something that reports diagnostics for a piece of script text.
pub trait Analyzer {
    /// Analyze `source` and return diagnostics in its own coordinates.
    fn analyze(&self, source: &str) -> Vec<Diagnostic>;
}

impl<F> Analyzer for F
where
    F: Fn(&str) -> Vec<Diagnostic>,
{
    fn analyze(&self, source: &str) -> Vec<Diagnostic> {
        self(source)
    }
}

/// A script block after normalization.
#[derive(Debug, Clone)]
pub struct PreparedBlock {
    pub block: ScriptBlock,
    /// The policy actually applied: the block's `data-indent` or the settings.
    pub policy: IndentPolicy,
    pub bad_lines: Vec<BadIndent>,
}

/// A document whose script blocks are ready for analysis.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    mode: DocumentMode,
    blocks: Vec<PreparedBlock>,
    mapper: DocumentMapper,
    report_bad_indent: bool,
}

/// Parse `text`, choosing the mode from `path`, and prepare its script blocks.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the document is not well-formed XML in XML
/// mode, or a source-map error for an internal position mismatch.
pub fn preprocess(text: &str, path: &Path, settings: &CompiledSettings) -> Result<Preprocessed> {
    preprocess_with_mode(text, settings.mode_for_path(path), settings)
}

/// Like [`preprocess`] with an explicit document mode.
///
/// # Errors
///
/// See [`preprocess`].
pub fn preprocess_with_mode(
    text: &str,
    mode: DocumentMode,
    settings: &CompiledSettings,
) -> Result<Preprocessed> {
    let source = LineIndex::new(text);
    let document = scriptmap_markup::parse(text, mode)?;
    let script_blocks = extract_blocks(&source, &document, settings)?;

    let mut mapper = DocumentMapper::new(source);
    let mut blocks = Vec::with_capacity(script_blocks.len());

    for block in script_blocks {
        let policy = block.hints.declared_indent.unwrap_or(settings.indent);
        let normalized = normalize(&block.raw_text, &block.markup_edits, policy, settings.tab_width)?;

        mapper.push_block(BlockMapping::new(
            normalized.text,
            normalized.log,
            block.source_start.offset,
        ));
        blocks.push(PreparedBlock {
            block,
            policy,
            bad_lines: normalized.bad_lines,
        });
    }

    Ok(Preprocessed {
        mode,
        blocks,
        mapper,
        report_bad_indent: settings.report_bad_indent,
    })
}

impl Preprocessed {
    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    pub fn blocks(&self) -> &[PreparedBlock] {
        &self.blocks
    }

    pub fn mapper(&self) -> &DocumentMapper {
        &self.mapper
    }

    /// The normalized text of each block, in document order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        (0..self.mapper.block_count()).filter_map(|i| {
            self.mapper
                .block(i)
                .ok()
                .map(BlockMapping::normalized_text)
        })
    }

    /// One warning per clamped line, at column 1 of its document line.
    ///
    /// # Errors
    ///
    /// Returns a source-map error if a recorded line start is outside the
    /// document.
    pub fn bad_indent_diagnostics(&self) -> Result<Vec<Diagnostic>> {
        let source = self.mapper.source();
        let mut diagnostics = Vec::new();

        for prepared in &self.blocks {
            for bad in &prepared.bad_lines {
                let location = source.location_of(prepared.block.source_start.offset + bad.offset)?;
                diagnostics.push(Diagnostic::new(
                    BAD_INDENT_MESSAGE,
                    location.line,
                    1,
                    Severity::Warning,
                ));
            }
        }

        Ok(diagnostics)
    }

    /// Map per-block diagnostics back to the document.
    ///
    /// `per_block[i]` holds the diagnostics for block `i`. Bad-indent
    /// warnings are added when enabled, and the result is sorted by
    /// position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchBlock`] if there are more diagnostic lists than
    /// blocks, or a source-map error for a position outside a block's text.
    pub fn postprocess(&self, per_block: Vec<Vec<Diagnostic>>) -> Result<Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();

        for (index, block_diagnostics) in per_block.into_iter().enumerate() {
            if index >= self.mapper.block_count() {
                return Err(Error::NoSuchBlock {
                    index,
                    count: self.mapper.block_count(),
                });
            }
            for diagnostic in &block_diagnostics {
                diagnostics.push(self.mapper.remap(index, diagnostic)?);
            }
        }

        if self.report_bad_indent {
            diagnostics.extend(self.bad_indent_diagnostics()?);
        }

        diagnostics.sort_by_key(|d| (d.line, d.column));
        Ok(diagnostics)
    }
}

/// Preprocess, analyze and postprocess one document.
///
/// A document that fails to parse yields a single fatal diagnostic at the
/// offending position instead of an error.
///
/// # Errors
///
/// Returns an error only for failures other than parsing.
pub fn lint(
    text: &str,
    path: &Path,
    settings: &CompiledSettings,
    analyzer: &dyn Analyzer,
) -> Result<Vec<Diagnostic>> {
    let preprocessed = match preprocess(text, path, settings) {
        Ok(preprocessed) => preprocessed,
        Err(Error::Parse(err)) => {
            tracing::debug!(path = %path.display(), "Document failed to parse: {}", err);
            return Ok(vec![parse_error_diagnostic(text, &err)?]);
        }
        Err(err) => return Err(err),
    };

    let per_block = preprocessed
        .texts()
        .map(|block_text| analyzer.analyze(block_text))
        .collect();
    preprocessed.postprocess(per_block)
}

/// The fatal diagnostic reported for a document that cannot be parsed.
///
/// # Errors
///
/// Returns a source-map error if the error position is outside `text`.
pub fn parse_error_diagnostic(text: &str, err: &MarkupError) -> Result<Diagnostic> {
    let location = match err.position() {
        Some(offset) => LineIndex::new(text).location_of(offset)?,
        None => scriptmap_source_map::Location::START,
    };
    Ok(Diagnostic::new(
        format!("Parsing error: {}", err),
        location.line,
        location.column,
        Severity::Error,
    )
    .fatal())
}
