//! Command-Line Interface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Gaze Pipeline - fixation, transition and triplet extraction from AOI annotations
#[derive(Parser, Debug)]
#[command(name = "gaze-pipeline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Settings file locations shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Base settings file (YAML, TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Variant file applied over the base, e.g. the toy-absent patterns
    #[arg(long)]
    pub variant: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process an annotation table and write the output tables
    Run {
        /// Input CSV of per-frame annotations
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Process trials one at a time
        #[arg(long)]
        serial: bool,
    },

    /// Load and validate settings, then print them
    CheckConfig {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
