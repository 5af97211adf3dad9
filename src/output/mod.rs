//! Terminal output for the `dirsum` binary.
//!
//! Status messages go to stderr and honour the verbosity level; the change
//! listing of a check goes to stdout so it can be piped.

use crate::diff::{Change, ChangeKind, DiffSummary};
use crate::error::ScanError;
use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only warnings, errors and the change listing.
    Quiet = 0,
    /// Default level.
    Normal = 1,
    /// Adds timing and per-step detail.
    Verbose = 2,
}

/// Global verbosity setting (default: Normal).
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the verbosity level for all output functions.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Current verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message in bold red (always shown).
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints a message only in verbose mode.
pub fn verbose(message: &str) {
    if get_verbosity() != Verbosity::Verbose {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints the changed lines of a check, one per line on stdout.
pub fn changes(changes: &[Change]) {
    for change in changes {
        let line = change.to_string();
        match change.kind {
            ChangeKind::Added => println!("{}", line.green()),
            ChangeKind::Removed => println!("{}", line.red()),
        }
    }
}

/// Prints every collected scan error as a warning.
pub fn scan_errors(errors: &[ScanError]) {
    for e in errors {
        warning(&e.to_string());
    }
}

/// One-line description of a diff summary, e.g. `2 added, 1 removed`.
#[must_use]
pub fn describe_summary(summary: DiffSummary) -> String {
    format!(
        "{} added, {} removed",
        summary.added.to_string().green(),
        summary.removed.to_string().red()
    )
}
