//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental repository issue harvester
#[derive(Parser, Debug)]
#[command(name = "issue-source")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository owner
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long, global = true)]
    pub repository: Option<String>,

    /// Topic records are published under
    #[arg(long, global = true)]
    pub topic: Option<String>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Output file for records (JSON lines, default stdout)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Format of status messages
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Poll continuously until interrupted (Ctrl-C)
    Run,

    /// Run one fetch cycle and print its outcome
    Poll,

    /// Test access to the configured repository
    Check,

    /// Print the persisted cursor
    State,

    /// Remove the persisted cursor
    Reset,
}

/// Status message format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
