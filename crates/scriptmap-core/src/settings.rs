/*
 * settings.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! User-facing settings and their validated, compiled form.
//!
//! Settings use kebab-case keys. Every key is also accepted with an `html/`
//! prefix (`html/indent`, `html/report-bad-indent`, ...) so that a shared
//! linter configuration block can be passed in unchanged.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use scriptmap_markup::DocumentMode;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// How leading whitespace of a script block is rewritten before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawIndent", into = "RawIndent")]
pub enum IndentPolicy {
    /// Strip the smallest indentation found on any non-blank line.
    #[default]
    Auto,
    /// The first non-blank line gets exactly this width; other lines keep
    /// their indentation relative to it.
    Absolute(usize),
    /// The `Auto` result shifted by this many columns.
    Relative(isize),
}

impl FromStr for IndentPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || SettingsError::InvalidIndent(s.to_string());

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(IndentPolicy::Auto);
        }

        let (sign, digits) = match trimmed.as_bytes()[0] {
            b'+' => (Some(1), &trimmed[1..]),
            b'-' => (Some(-1), &trimmed[1..]),
            _ => (None, trimmed),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        match sign {
            Some(sign) => {
                let amount: isize = digits.parse().map_err(|_| invalid())?;
                Ok(IndentPolicy::Relative(sign * amount))
            }
            None => digits
                .parse()
                .map(IndentPolicy::Absolute)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for IndentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndentPolicy::Auto => write!(f, "auto"),
            IndentPolicy::Absolute(width) => write!(f, "{}", width),
            IndentPolicy::Relative(shift) => write!(f, "{:+}", shift),
        }
    }
}

/// Wire form of an indent policy: a bare integer or a descriptor string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawIndent {
    Int(i64),
    Str(String),
}

impl TryFrom<RawIndent> for IndentPolicy {
    type Error = SettingsError;

    fn try_from(raw: RawIndent) -> Result<Self, Self::Error> {
        match raw {
            RawIndent::Int(width) => usize::try_from(width)
                .map(IndentPolicy::Absolute)
                .map_err(|_| SettingsError::InvalidIndent(width.to_string())),
            RawIndent::Str(s) => s.parse(),
        }
    }
}

impl From<IndentPolicy> for RawIndent {
    fn from(policy: IndentPolicy) -> Self {
        match policy {
            IndentPolicy::Absolute(width) => RawIndent::Int(width as i64),
            other => RawIndent::Str(other.to_string()),
        }
    }
}

/// Settings as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    #[serde(alias = "html/indent")]
    pub indent: IndentPolicy,

    /// Emit a diagnostic for every line that had to be clamped while
    /// re-indenting.
    #[serde(alias = "html/report-bad-indent")]
    pub report_bad_indent: bool,

    /// Force XML (`true`) or HTML (`false`) parsing; `None` picks by extension.
    #[serde(alias = "html/xml-mode")]
    pub xml_mode: Option<bool>,

    #[serde(alias = "html/html-extensions")]
    pub html_extensions: Vec<String>,

    #[serde(alias = "html/xml-extensions")]
    pub xml_extensions: Vec<String>,

    /// Exact MIME types or `/regex/flags` patterns that mark a script as
    /// JavaScript.
    #[serde(alias = "html/javascript-mime-types")]
    pub javascript_mime_types: Vec<String>,

    #[serde(alias = "html/tab-width")]
    pub tab_width: usize,

    /// Keep script elements whose body is empty.
    #[serde(alias = "html/keep-empty-blocks")]
    pub keep_empty_blocks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            indent: IndentPolicy::Auto,
            report_bad_indent: false,
            xml_mode: None,
            html_extensions: [
                "erb",
                "handlebars",
                "hbs",
                "htm",
                "html",
                "mustache",
                "nunjucks",
                "php",
                "tag",
                "twig",
                "we",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
            xml_extensions: vec!["xhtml".to_string(), "xml".to_string()],
            javascript_mime_types: vec![
                r"/^(application|text)\/(x-)?(javascript|babel|ecmascript-6)$/i".to_string(),
                "module".to_string(),
            ],
            tab_width: 1,
            keep_empty_blocks: false,
        }
    }
}

impl Settings {
    /// Validate the settings and compile MIME patterns.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] for a zero tab width or a MIME pattern that
    /// is not a valid regular expression.
    pub fn compile(&self) -> Result<CompiledSettings, SettingsError> {
        if self.tab_width == 0 {
            return Err(SettingsError::ZeroTabWidth);
        }

        let mime_types = self
            .javascript_mime_types
            .iter()
            .map(|entry| MimeMatcher::parse(entry))
            .collect::<Result<Vec<_>, _>>()?;

        let normalize = |exts: &[String]| -> Vec<String> {
            exts.iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect()
        };

        Ok(CompiledSettings {
            indent: self.indent,
            report_bad_indent: self.report_bad_indent,
            xml_mode: self.xml_mode,
            html_extensions: normalize(&self.html_extensions),
            xml_extensions: normalize(&self.xml_extensions),
            mime_types,
            tab_width: self.tab_width,
            keep_empty_blocks: self.keep_empty_blocks,
        })
    }
}

/// Validated settings ready for use by the pipeline.
#[derive(Debug, Clone)]
pub struct CompiledSettings {
    pub indent: IndentPolicy,
    pub report_bad_indent: bool,
    pub xml_mode: Option<bool>,
    pub html_extensions: Vec<String>,
    pub xml_extensions: Vec<String>,
    mime_types: Vec<MimeMatcher>,
    pub tab_width: usize,
    pub keep_empty_blocks: bool,
}

impl Default for CompiledSettings {
    fn default() -> Self {
        // The default MIME pattern is a constant known to compile
        Settings::default()
            .compile()
            .unwrap_or_else(|_| CompiledSettings {
                indent: IndentPolicy::Auto,
                report_bad_indent: false,
                xml_mode: None,
                html_extensions: Vec::new(),
                xml_extensions: Vec::new(),
                mime_types: vec![MimeMatcher::Exact("module".to_string())],
                tab_width: 1,
                keep_empty_blocks: false,
            })
    }
}

impl CompiledSettings {
    /// Pick the parse mode for a file.
    ///
    /// A forced `xml-mode` wins. Otherwise files with an XML extension parse
    /// as XML and everything else as HTML.
    pub fn mode_for_path(&self, path: &Path) -> DocumentMode {
        match self.xml_mode {
            Some(true) => return DocumentMode::Xml,
            Some(false) => return DocumentMode::Html,
            None => {}
        }

        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match ext {
            Some(ext) if self.xml_extensions.contains(&ext) => DocumentMode::Xml,
            Some(ext) if !self.html_extensions.contains(&ext) => {
                tracing::debug!(
                    path = %path.display(),
                    "Unknown extension, parsing as HTML"
                );
                DocumentMode::Html
            }
            _ => DocumentMode::Html,
        }
    }

    /// True if `mime_type` names JavaScript under the configured MIME types.
    ///
    /// Parameters after `;` are ignored.
    pub fn is_javascript_mime(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.mime_types.iter().any(|matcher| matcher.matches(essence))
    }
}

#[derive(Debug, Clone)]
enum MimeMatcher {
    Exact(String),
    Pattern(Regex),
}

impl MimeMatcher {
    /// Parse an exact MIME string or a `/pattern/flags` regular expression.
    fn parse(entry: &str) -> Result<Self, SettingsError> {
        let Some((pattern, flags)) = entry
            .strip_prefix('/')
            .and_then(|rest| rest.rsplit_once('/'))
        else {
            return Ok(MimeMatcher::Exact(entry.trim().to_string()));
        };

        let invalid = |message: String| SettingsError::InvalidMimePattern {
            pattern: entry.to_string(),
            message,
        };

        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                // Global, sticky and unicode flags do not change matching here
                'g' | 'y' | 'u' => &mut builder,
                other => return Err(invalid(format!("unsupported flag `{}`", other))),
            };
        }

        builder
            .build()
            .map(MimeMatcher::Pattern)
            .map_err(|err| invalid(err.to_string()))
    }

    fn matches(&self, mime_type: &str) -> bool {
        match self {
            MimeMatcher::Exact(expected) => expected.eq_ignore_ascii_case(mime_type),
            MimeMatcher::Pattern(regex) => regex.is_match(mime_type),
        }
    }
}
