/*
 * remap.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Remap command implementation
 */

//! Remap command implementation.
//!
//! Reads the diagnostics an external analyzer produced for each script
//! block of a document (a JSON array with one diagnostic list per block, in
//! the order `extract` prints them) and writes them back out in document
//! coordinates.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use scriptmap_core::pipeline::parse_error_diagnostic;
use scriptmap_core::{CompiledSettings, Diagnostic, Error, preprocess};

use crate::SettingsArgs;
use crate::commands::{load_settings, read_document};

/// Arguments for the remap command
#[derive(Debug)]
pub struct RemapArgs {
    pub file: PathBuf,
    pub diagnostics: PathBuf,
    pub settings: SettingsArgs,
}

/// Execute the remap command
pub fn execute(args: RemapArgs) -> Result<()> {
    let settings = load_settings(&args.settings)?;
    let text = read_document(&args.file)?;
    let per_block = read_diagnostics(&args.diagnostics)?;

    let remapped = remap_document(&text, &args.file, per_block, &settings)
        .with_context(|| format!("Failed to remap diagnostics for {}", args.file.display()))?;

    println!("{}", serde_json::to_string_pretty(&remapped)?);
    Ok(())
}

/// Map per-block diagnostics into document coordinates.
///
/// A document that fails to parse yields its single fatal parse diagnostic,
/// the same one `lint` reports, and the supplied diagnostics are ignored.
fn remap_document(
    text: &str,
    file: &Path,
    per_block: Vec<Vec<Diagnostic>>,
    settings: &CompiledSettings,
) -> scriptmap_core::Result<Vec<Diagnostic>> {
    let preprocessed = match preprocess(text, file, settings) {
        Ok(preprocessed) => preprocessed,
        Err(Error::Parse(err)) => {
            warn!("{}: document failed to parse: {}", file.display(), err);
            return Ok(vec![parse_error_diagnostic(text, &err)?]);
        }
        Err(err) => return Err(err),
    };
    debug!(
        blocks = preprocessed.blocks().len(),
        lists = per_block.len(),
        "Remapping diagnostics"
    );

    preprocessed.postprocess(per_block)
}

fn read_diagnostics(path: &Path) -> Result<Vec<Vec<Diagnostic>>> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read diagnostics from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diagnostics file: {}", path.display()))?
    };

    serde_json::from_str(&content).context("Diagnostics must be a JSON array of diagnostic arrays")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_diagnostics_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("diagnostics.json");
        fs::write(
            &path,
            r#"[[{"message":"m","line":2,"column":1,"severity":"warning","ruleId":"no-console"}],[]]"#,
        )
        .unwrap();

        let per_block = read_diagnostics(&path).unwrap();
        assert_eq!(per_block.len(), 2);
        assert_eq!(per_block[0][0].rule_id.as_deref(), Some("no-console"));

        let text = "<div>\n  <script>\n    console.log(1);\n  </script>\n  <script>x</script>\n</div>";
        let remapped = remap_document(
            text,
            Path::new("a.html"),
            per_block,
            &CompiledSettings::default(),
        )
        .unwrap();
        assert_eq!((remapped[0].line, remapped[0].column), (3, 5));
    }

    #[test]
    fn test_read_diagnostics_rejects_flat_list() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("flat.json");
        fs::write(&path, r#"[{"message":"m","line":1,"column":1,"severity":"error"}]"#).unwrap();

        let err = read_diagnostics(&path).unwrap_err();
        assert!(err.to_string().contains("JSON array of diagnostic arrays"));
    }

    #[test]
    fn test_unparsable_document_yields_fatal_diagnostic() {
        let text = "<html>\n<script>\nif (a < b) go();\n</script>\n</html>";
        let per_block = vec![vec![Diagnostic::new(
            "m",
            1,
            1,
            scriptmap_core::Severity::Warning,
        )]];

        let remapped = remap_document(
            text,
            Path::new("page.xhtml"),
            per_block,
            &CompiledSettings::default(),
        )
        .unwrap();

        assert_eq!(remapped.len(), 1);
        assert!(remapped[0].fatal);
        assert_eq!((remapped[0].line, remapped[0].column), (3, 7));
        insta::assert_snapshot!(remapped[0].message, @"Parsing error: Unexpected token <");
    }
}
