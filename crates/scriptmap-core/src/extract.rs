/*
 * extract.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Script block extraction.
//!
//! Walks the parsed element records in document order and turns every
//! `<script>` element that holds inline JavaScript into a [`ScriptBlock`].

use std::sync::LazyLock;

use regex::Regex;
use scriptmap_markup::{Document, Element};
use scriptmap_source_map::{Edit, LineIndex, Location, SourceMapError, TransformLog};

use crate::error::Result;
use crate::settings::{CompiledSettings, IndentPolicy};

/// Legacy `language` attribute values that name JavaScript.
static JAVASCRIPT_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(java|ecma)script[0-9.]*$").expect("Invalid regex pattern for script language")
});

/// One inline script, ready for normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBlock {
    /// Raw source text between the opening tag's `>` and the closing tag.
    pub raw_text: String,

    /// Location of the first character of `raw_text` in the document.
    pub source_start: Location,

    /// Markup inside the raw text that is not script (XML mode only), with
    /// offsets relative to `raw_text`.
    pub markup_edits: Vec<Edit>,

    pub hints: BlockHints,
}

/// Per-block information taken from the script element's attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHints {
    /// Indent policy from a `data-indent` attribute; overrides the settings.
    pub declared_indent: Option<IndentPolicy>,
    pub mime_type: Option<String>,
    pub is_module: bool,
}

impl ScriptBlock {
    /// The script text with markup edits applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup edits do not fit the raw text.
    pub fn character_data(&self) -> Result<String> {
        if self.markup_edits.is_empty() {
            return Ok(self.raw_text.clone());
        }
        let log = TransformLog::new(self.markup_edits.clone())?;
        Ok(log.apply(&self.raw_text)?)
    }
}

/// Collect the script blocks of a parsed document, in document order.
///
/// # Errors
///
/// Returns an error if an element's content range does not fit `source`.
pub fn extract_blocks(
    source: &LineIndex,
    document: &Document,
    settings: &CompiledSettings,
) -> Result<Vec<ScriptBlock>> {
    let mut blocks = Vec::new();

    for element in document.elements_named("script") {
        if let Some(block) = extract_block(source, element, settings)? {
            blocks.push(block);
        }
    }

    tracing::debug!(
        mode = %document.mode,
        count = blocks.len(),
        "Extracted script blocks"
    );
    Ok(blocks)
}

fn extract_block(
    source: &LineIndex,
    element: &Element,
    settings: &CompiledSettings,
) -> Result<Option<ScriptBlock>> {
    let Some(content) = &element.content else {
        tracing::trace!(offset = element.start, "Skipping self-closing script");
        return Ok(None);
    };

    let mime_type = element
        .get_attribute("type")
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match mime_type {
        Some(mime) if !settings.is_javascript_mime(mime) => {
            tracing::trace!(offset = element.start, mime, "Skipping non-JavaScript script");
            return Ok(None);
        }
        None => {
            if let Some(language) = element.get_attribute("language") {
                if !JAVASCRIPT_LANGUAGE.is_match(language.trim()) {
                    tracing::trace!(offset = element.start, language, "Skipping non-JavaScript language");
                    return Ok(None);
                }
            }
        }
        Some(_) => {}
    }

    let start = content.range.start;
    let raw_text = source
        .text()
        .get(content.range.clone())
        .ok_or(SourceMapError::OffsetOutOfRange {
            offset: content.range.end,
            len: source.len(),
        })?
        .to_string();

    let markup_edits: Vec<Edit> = content
        .edits
        .iter()
        .map(|edit| {
            Edit::new(
                edit.range.start - start..edit.range.end - start,
                edit.replacement.clone(),
            )
        })
        .collect();

    let block = ScriptBlock {
        raw_text,
        source_start: source.location_of(start)?,
        markup_edits,
        hints: BlockHints {
            declared_indent: declared_indent(element),
            mime_type: mime_type.map(str::to_string),
            is_module: mime_type.is_some_and(|m| m.eq_ignore_ascii_case("module")),
        },
    };

    if element.has_attribute("src") && block.character_data()?.trim().is_empty() {
        tracing::trace!(offset = element.start, "Skipping external script");
        return Ok(None);
    }

    if block.raw_text.is_empty() && !settings.keep_empty_blocks {
        tracing::trace!(offset = element.start, "Skipping empty script");
        return Ok(None);
    }

    Ok(Some(block))
}

fn declared_indent(element: &Element) -> Option<IndentPolicy> {
    let value = element.get_attribute("data-indent")?;
    match value.parse() {
        Ok(policy) => Some(policy),
        Err(err) => {
            tracing::warn!(offset = element.start, "Ignoring data-indent: {}", err);
            None
        }
    }
}
