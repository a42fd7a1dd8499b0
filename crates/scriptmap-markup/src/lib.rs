/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Position-tracked markup parsing for script extraction.
//!
//! This crate turns HTML or XML source text into a flat, document-ordered
//! list of [`Element`] records. Each record carries the tag name, the
//! attributes, and the byte range of the element's content in the original
//! source, which is all the script extractor needs.
//!
//! Two modes are supported:
//! - [`DocumentMode::Html`]: lenient, tag-soup tolerant parsing backed by
//!   `tree-sitter-html`. Script bodies are raw text and never fail to parse.
//! - [`DocumentMode::Xml`]: strict parsing backed by `quick-xml`. CDATA
//!   sections, comments, entity references and nested elements inside an
//!   element's content are reported as [`Edit`]s so the character data can be
//!   recovered without losing track of source offsets.
//!
//! # Example
//!
//! ```rust
//! use scriptmap_markup::{parse, DocumentMode};
//!
//! let source = "<html><script type=\"module\">go()</script></html>";
//! let doc = parse(source, DocumentMode::Html).unwrap();
//!
//! let script = doc.elements_named("script").next().unwrap();
//! assert_eq!(script.get_attribute("type"), Some("module"));
//!
//! let content = script.content.as_ref().unwrap();
//! assert_eq!(&source[content.range.clone()], "go()");
//! ```

pub mod error;
pub mod html;
pub mod types;
pub mod xml;

pub use error::{MarkupError, Result};
pub use scriptmap_source_map::Edit;
pub use types::{Attribute, Content, Document, DocumentMode, Element};

/// Parse `source` in the given mode.
///
/// # Errors
///
/// XML mode returns a [`MarkupError`] positioned at the offending byte when the
/// document is not well-formed. HTML mode only fails if the grammar cannot be
/// loaded.
pub fn parse(source: &str, mode: DocumentMode) -> Result<Document> {
    match mode {
        DocumentMode::Html => html::parse(source),
        DocumentMode::Xml => xml::parse(source),
    }
}
