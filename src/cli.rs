//! Command-line interface definitions for dirsum.
//!
//! Shared between the binary and the xtask man page generator.
//!
//! Field-level documentation is provided via clap doc comments, so
//! missing_docs is allowed for this module.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for dirsum.
#[derive(Parser)]
#[command(
    name = "dirsum",
    version = crate::VERSION,
    about = "Record and verify file checksums of a directory tree",
    long_about = "Keeps a plain-text manifest of relative directory, name, modification time \
                  and content hash for every file below a base directory, and checks the tree \
                  against it. Updates and checks can be restricted to a sub-directory."
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Base directory all paths are recorded relative to
    #[arg(short = 'C', long = "base", global = true, default_value = ".")]
    pub base: PathBuf,

    /// Manifest file (default: <BASE>/.dirsum.csv)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Comma-separated extensions to record, or `*` for every file
    #[arg(short = 't', long = "types", global = true)]
    pub types: Option<String>,

    /// Configuration file
    #[arg(short, long, global = true, env = "DIRSUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Append the log to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Create the manifest, or refresh the entries of one directory
    Update {
        /// Directory to re-scan (default: the base)
        scope: Option<PathBuf>,

        /// Rewrite the scope even if nothing changed
        #[arg(short, long)]
        force: bool,
    },

    /// Compare the tree against the manifest without writing
    Check {
        /// Directory to check (default: the base)
        scope: Option<PathBuf>,

        /// Run the full comparison even if the stored and scanned lines are identical
        #[arg(short, long)]
        force: bool,

        /// Report unreadable files and continue instead of aborting
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
