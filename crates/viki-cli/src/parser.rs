//! Root CLI parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the VIKI speech orchestrator.
///
/// Global options apply to every subcommand.
#[derive(Parser)]
#[command(name = "viki")]
#[command(about = "Detect, voice and speak text the way the VIKI assistant does")]
#[command(version)]
pub struct Cli {
    /// Load language profiles from this JSON file instead of the built-in table
    #[arg(long = "profiles", global = true, env = "VIKI_PROFILES")]
    pub profiles: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
