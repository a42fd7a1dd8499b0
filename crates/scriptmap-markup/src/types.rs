/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Element records produced by the markup parsers.

use std::fmt;
use std::ops::Range;

use scriptmap_source_map::Edit;
use serde::{Deserialize, Serialize};

/// How a document is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentMode {
    /// Lenient HTML parsing; script bodies are raw text.
    Html,
    /// Strict, namespace-aware XML parsing.
    Xml,
}

impl fmt::Display for DocumentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentMode::Html => write!(f, "html"),
            DocumentMode::Xml => write!(f, "xml"),
        }
    }
}

/// A parsed document: every element in document order.
///
/// Elements are plain records with no back-references; `depth` records the
/// nesting level for callers that need it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub mode: DocumentMode,
    pub elements: Vec<Element>,
}

impl Document {
    /// Elements whose local name matches `name`, ignoring ASCII case.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |element| element.name.eq_ignore_ascii_case(name))
    }
}

/// A single element with source positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// The local name of the element (without namespace prefix).
    ///
    /// HTML names are lowercased; XML names keep their case.
    pub name: String,

    /// Namespace prefix, if any (e.g., "h" in `<h:script>`).
    pub prefix: Option<String>,

    /// Attributes in source order.
    pub attributes: Vec<Attribute>,

    /// Byte offset of the `<` that opens the element.
    pub start: usize,

    /// Nesting level; top-level elements have depth 0.
    pub depth: usize,

    /// Content between the start and end tags, `None` for self-closing tags.
    pub content: Option<Content>,
}

/// An attribute and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The local name of the attribute (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any.
    pub prefix: Option<String>,

    /// The attribute value (XML entities unescaped).
    pub value: String,
}

/// The content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Byte range from just after the start tag's `>` to the start of the end
    /// tag (or the end of the input for an unterminated HTML raw-text element).
    pub range: Range<usize>,

    /// Markup inside `range` that is not character data, with absolute
    /// offsets, sorted. Applying these edits to the content yields its
    /// character data. Always empty in HTML mode.
    pub edits: Vec<Edit>,
}

impl Content {
    /// The raw source text of the content.
    pub fn raw<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.range.clone()).unwrap_or_default()
    }
}

impl Element {
    /// Get an attribute value by local name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check if the element has an attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}
