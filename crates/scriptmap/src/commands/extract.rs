/*
 * extract.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Extract command implementation
 */

//! Extract command implementation.
//!
//! Prints the normalized script blocks of each document along with the
//! document position each block starts at. A document that fails to parse
//! is reported and skipped; the others are still processed.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{error, info};

use scriptmap_core::{CompiledSettings, Error, Preprocessed, preprocess};
use scriptmap_markup::DocumentMode;

use crate::SettingsArgs;
use crate::commands::{load_settings, read_document};

/// Arguments for the extract command
#[derive(Debug)]
pub struct ExtractArgs {
    pub files: Vec<PathBuf>,
    pub settings: SettingsArgs,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<DocumentMode>,
    blocks: Vec<BlockReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct BlockReport {
    line: usize,
    column: usize,
    offset: usize,
    indent: String,
    text: String,
}

/// Execute the extract command
pub fn execute(args: ExtractArgs) -> Result<()> {
    let settings = load_settings(&args.settings)?;

    let mut reports = Vec::with_capacity(args.files.len());
    let mut failures = 0;

    for file in &args.files {
        let report = extract_file(file, &settings)?;
        if let Some(message) = &report.error {
            error!("{}: {}", file.display(), message);
            failures += 1;
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    info!(
        files = reports.len(),
        failures, "Extracted script blocks"
    );
    if failures > 0 {
        anyhow::bail!("{} of {} file(s) could not be parsed", failures, reports.len());
    }
    Ok(())
}

fn extract_file(file: &Path, settings: &CompiledSettings) -> Result<FileReport> {
    let text = read_document(file)?;
    let name = file.display().to_string();

    match preprocess(&text, file, settings) {
        Ok(preprocessed) => Ok(FileReport {
            file: name,
            mode: Some(preprocessed.mode()),
            blocks: block_reports(&preprocessed),
            error: None,
        }),
        Err(Error::Parse(err)) => {
            let diagnostic = scriptmap_core::pipeline::parse_error_diagnostic(&text, &err)?;
            Ok(FileReport {
                file: name,
                mode: None,
                blocks: Vec::new(),
                error: Some(format!(
                    "{}:{}: {}",
                    diagnostic.line, diagnostic.column, diagnostic.message
                )),
            })
        }
        Err(err) => Err(err.into()),
    }
}

fn block_reports(preprocessed: &Preprocessed) -> Vec<BlockReport> {
    preprocessed
        .blocks()
        .iter()
        .zip(preprocessed.texts())
        .map(|(prepared, text)| BlockReport {
            line: prepared.block.source_start.line,
            column: prepared.block.source_start.column,
            offset: prepared.block.source_start.offset,
            indent: prepared.policy.to_string(),
            text: text.to_string(),
        })
        .collect()
}

fn print_report(report: &FileReport) {
    match report.mode {
        Some(mode) => println!("== {} ({}) ==", report.file, mode),
        None => println!("== {} ==", report.file),
    }
    if let Some(message) = &report.error {
        println!("error: {}", message);
        return;
    }
    for (i, block) in report.blocks.iter().enumerate() {
        println!(
            "-- block {} at {}:{} (indent {}) --",
            i + 1,
            block.line,
            block.column,
            block.indent
        );
        println!("{}", block.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_file_reports_blocks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.html");
        fs::write(&path, "<p>\n  <script>\n    go();\n  </script>\n</p>").unwrap();

        let report = extract_file(&path, &CompiledSettings::default()).unwrap();

        assert_eq!(report.mode, Some(DocumentMode::Html));
        assert_eq!(report.blocks.len(), 1);
        assert_eq!((report.blocks[0].line, report.blocks[0].column), (2, 11));
        assert_eq!(report.blocks[0].text, "\ngo();\n  ");
        assert_eq!(report.blocks[0].indent, "auto");
    }

    #[test]
    fn test_extract_file_reports_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.xhtml");
        fs::write(&path, "<html><script>a < b</script></html>").unwrap();

        let report = extract_file(&path, &CompiledSettings::default()).unwrap();

        assert!(report.blocks.is_empty());
        assert_eq!(
            report.error.as_deref(),
            Some("1:17: Parsing error: Unexpected token <")
        );
    }
}
