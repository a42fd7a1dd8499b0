//! Command implementations for the scriptmap CLI
//!
//! Each command module handles the CLI interface and delegates to
//! scriptmap-core for the actual work.

pub mod extract;
pub mod remap;

use std::path::Path;

use anyhow::{Context, Result};
use scriptmap_core::{CompiledSettings, Settings};

use crate::SettingsArgs;

/// Load the settings file, if any, and apply command-line overrides.
pub fn load_settings(args: &SettingsArgs) -> Result<CompiledSettings> {
    let mut settings = match &args.settings {
        Some(path) => read_settings_file(path)?,
        None => Settings::default(),
    };

    if let Some(indent) = &args.indent {
        settings.indent = indent
            .parse()
            .with_context(|| format!("Invalid --indent value: {}", indent))?;
    }
    if args.xml {
        settings.xml_mode = Some(true);
    } else if args.html {
        settings.xml_mode = Some(false);
    }
    if args.report_bad_indent {
        settings.report_bad_indent = true;
    }
    if let Some(tab_width) = args.tab_width {
        settings.tab_width = tab_width;
    }

    settings.compile().context("Invalid settings")
}

fn read_settings_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }
}

/// Read a document as UTF-8 text.
pub fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
