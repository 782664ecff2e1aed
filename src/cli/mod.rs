//! CLI module
//!
//! Command-line interface for running the harvester.
//!
//! # Commands
//!
//! - `run` - Poll until interrupted
//! - `poll` - Run a single fetch cycle
//! - `check` - Test access to the repository
//! - `state` - Show the persisted cursor
//! - `reset` - Forget the persisted cursor

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
