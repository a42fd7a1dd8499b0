//! scriptmap CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "scriptmap")]
#[command(version)]
#[command(about = "Extract inline scripts from HTML and XML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized script blocks of one or more documents
    Extract {
        /// Documents to read
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Map per-block analyzer diagnostics back onto a document
    Remap {
        /// The document the diagnostics were computed for
        file: PathBuf,

        /// JSON file holding one diagnostic list per script block ('-' for stdin)
        #[arg(short, long)]
        diagnostics: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Options shared by every command that reads documents.
#[derive(Args, Debug, Clone, Default)]
struct SettingsArgs {
    /// Settings file (JSON or YAML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Indentation policy: "auto", a width, or "+N"/"-N"
    #[arg(long)]
    indent: Option<String>,

    /// Parse every document as XML
    #[arg(long, conflicts_with = "html")]
    xml: bool,

    /// Parse every document as HTML
    #[arg(long)]
    html: bool,

    /// Report lines whose indentation had to be clamped
    #[arg(long)]
    report_bad_indent: bool,

    /// Columns per tab when measuring indentation
    #[arg(long)]
    tab_width: Option<usize>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriptmap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            files,
            settings,
            json,
        } => commands::extract::execute(commands::extract::ExtractArgs {
            files,
            settings,
            json,
        }),
        Commands::Remap {
            file,
            diagnostics,
            settings,
        } => commands::remap::execute(commands::remap::RemapArgs {
            file,
            diagnostics,
            settings,
        }),
    }
}
