//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Proscenium - declarative application shell runner
#[derive(Parser, Debug)]
#[command(name = "prosc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Boot an application document and print the resulting tree
    Run {
        /// Path to the application document (a JSON node tree)
        document: PathBuf,

        /// Directory that referenced documents resolve against
        /// (defaults to the application document's directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Navigate to this page after bootstrap
        #[arg(long)]
        navigate: Option<String>,

        /// Print the tree as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
