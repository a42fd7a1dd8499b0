/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Source mapping for extracted script text
//!
//! This crate provides the two position primitives the rest of scriptmap is
//! built on:
//!
//! - [`LineIndex`]: a text buffer with a newline index that converts byte
//!   offsets to 1-based (line, column) locations and back
//! - [`TransformLog`]: a sorted list of [`Edit`]s that rewrote a buffer, able
//!   to map offsets in the rewritten text back to the original
//!
//! # Example
//!
//! ```rust
//! use scriptmap_source_map::*;
//!
//! let original = "    foo();\n    bar();";
//! let log = TransformLog::new(vec![
//!     Edit::delete(0..4),
//!     Edit::delete(11..15),
//! ])
//! .unwrap();
//!
//! let normalized = log.apply(original).unwrap();
//! assert_eq!(normalized, "foo();\nbar();");
//!
//! // "bar" starts at offset 7 in the normalized text, 15 in the original
//! assert_eq!(log.to_original(7), OriginalOffset::Exact(15));
//!
//! let index = LineIndex::new(original);
//! let loc = index.location_of(15).unwrap();
//! assert_eq!((loc.line, loc.column), (2, 5));
//! ```

pub mod error;
pub mod line_index;
pub mod transform;
pub mod types;

pub use error::{Result, SourceMapError};
pub use line_index::LineIndex;
pub use transform::{Edit, OriginalOffset, TransformLog};
pub use types::Location;
