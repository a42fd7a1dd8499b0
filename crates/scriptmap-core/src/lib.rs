/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Script extraction and position remapping for HTML and XML documents.
//!
//! scriptmap-core pulls the inline JavaScript out of an HTML or XML
//! document so that a separate analyzer can check it, and maps the
//! analyzer's diagnostics back onto the original document.
//!
//! The steps are:
//!
//! 1. [`extract::extract_blocks`] finds the `<script>` elements that hold
//!    JavaScript and records where each body starts.
//! 2. [`indent::normalize`] rewrites each body's leading whitespace under an
//!    [`IndentPolicy`] and records every change in a
//!    [`TransformLog`](scriptmap_source_map::TransformLog).
//! 3. [`mapper::DocumentMapper`] composes the document index, the logs and
//!    the normalized-text indexes to translate positions back.
//!
//! [`pipeline::lint`] runs the whole thing against an [`Analyzer`].
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use scriptmap_core::{CompiledSettings, Diagnostic, Severity, lint};
//!
//! let html = "<body>\n  <script>\n    console.log(1);\n  </script>\n</body>";
//! let analyzer = |source: &str| {
//!     // Reports the first non-blank line of the normalized text
//!     assert!(source.starts_with("\nconsole.log(1);"));
//!     vec![Diagnostic::new("found console", 2, 1, Severity::Warning)]
//! };
//!
//! let diagnostics = lint(html, Path::new("page.html"), &CompiledSettings::default(), &analyzer).unwrap();
//! assert_eq!((diagnostics[0].line, diagnostics[0].column), (3, 5));
//! ```

pub mod diagnostic;
pub mod error;
pub mod extract;
pub mod indent;
pub mod mapper;
pub mod pipeline;
pub mod settings;

pub use diagnostic::{Diagnostic, Fix, Severity};
pub use error::{Error, Result, SettingsError};
pub use extract::{BlockHints, ScriptBlock};
pub use mapper::{BlockMapping, DocumentMapper, MappedLocation};
pub use pipeline::{Analyzer, Preprocessed, lint, preprocess, preprocess_with_mode};
pub use settings::{CompiledSettings, IndentPolicy, Settings};
