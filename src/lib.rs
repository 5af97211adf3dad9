#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)] // Line and entry counters cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # dirsum - Directory Checksum Manifests
//!
//! dirsum records the identity of every file below a base directory (relative
//! directory, name, modification time and content hash) in a plain-text
//! manifest, and later verifies the tree against it.
//!
//! ## Features
//!
//! - **Scoped updates**: re-scanning a sub-directory replaces only that
//!   directory's block of the manifest; every other line stays byte-identical
//! - **Scoped checks**: changes are reported only for the requested sub-tree,
//!   with containment decided on path segments
//! - **Atomic writes**: the manifest is replaced by rename, never edited in place
//! - **Fast hashing**: streaming XXH3-128
//!
//! ## Architecture
//!
//! - [`utils`]: path normalisation, field escaping, hashing and timestamps
//! - [`scanner`]: depth-first traversal producing table entries
//! - [`manifest`]: the on-disk table, scoped reads and atomic writes
//! - [`diff`]: line diff of a stored scope against a fresh scan
//! - [`commands`]: the update and check state machine
//! - [`config`], [`output`], [`cli`]: the binary's surroundings
//!
//! ## Example Usage
//!
//! ```no_run
//! use dirsum::{DirsumContext, commands};
//! use dirsum::scanner::FileTypeFilter;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = DirsumContext::new(Path::new("/data/photos"), FileTypeFilter::All)?;
//!
//! let update = commands::update::execute(&ctx, None, false)?;
//! println!("{}", update.reason);
//!
//! let check = commands::check::execute(&ctx, Some(Path::new("/data/photos/2024")), false, false)?;
//! assert!(!check.changed);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// The update and check operations.
pub mod commands;

/// Configuration file parsing and validation.
pub mod config;

/// Line diff between stored and scanned entries.
pub mod diff;

/// Typed errors of the manifest core.
pub mod error;

/// The on-disk manifest table.
pub mod manifest;

/// Output formatting and styling.
pub mod output;

/// Filesystem scanning.
pub mod scanner;

/// Utility functions and helpers.
pub mod utils;

pub use error::{Error, Result};

use config::{Config, DiffAlgorithm};
use error::PathError;
use manifest::{Header, Scope};
use scanner::{FileTypeFilter, Scanner};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use utils::paths::{RelDir, to_absolute, to_relative};

/// Current version of the dirsum binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Manifest file name used when none is configured.
pub const DEFAULT_MANIFEST_NAME: &str = ".dirsum.csv";

/// Settings shared by every operation of one invocation.
///
/// Built once from the command line and configuration, then only read. The
/// base directory is absolute and lexically normalised, so it can be compared
/// verbatim against the manifest header.
///
/// # Examples
///
/// ```no_run
/// use dirsum::DirsumContext;
/// use dirsum::scanner::FileTypeFilter;
/// use std::path::Path;
///
/// # fn main() -> dirsum::Result<()> {
/// let ctx = DirsumContext::new(Path::new("photos"), "jpg,png".parse().unwrap())?
///     .with_manifest(Path::new("/var/lib/dirsum/photos.csv"))?;
/// assert!(ctx.base.is_absolute());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirsumContext {
    /// Directory all relative paths are computed against.
    pub base: PathBuf,

    /// Manifest file.
    pub manifest_path: PathBuf,

    /// Which files get a record.
    pub file_types: FileTypeFilter,

    /// Whether the scanner follows symbolic links.
    pub follow_symlinks: bool,

    /// Line diff algorithm for check.
    pub diff_algorithm: DiffAlgorithm,
}

impl DirsumContext {
    /// Creates a context for `base` with the manifest at its default location
    /// inside `base`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if `base` cannot be resolved, is not a
    /// directory, or is not valid UTF-8.
    pub fn new(base: &Path, file_types: FileTypeFilter) -> Result<Self> {
        let base = resolve_base(base)?;
        Ok(Self {
            manifest_path: base.join(DEFAULT_MANIFEST_NAME),
            base,
            file_types,
            follow_symlinks: false,
            diff_algorithm: DiffAlgorithm::default(),
        })
    }

    /// Creates a context from configuration, with command-line values taking
    /// precedence over it.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the base or manifest path cannot be resolved.
    pub fn from_config(
        base: &Path,
        manifest: Option<&Path>,
        file_types: Option<FileTypeFilter>,
        config: &Config,
    ) -> Result<Self> {
        let file_types = file_types.unwrap_or_else(|| {
            FileTypeFilter::from_extensions(config.core.file_types.split(','))
        });
        let mut ctx = Self::new(base, file_types)?;
        ctx.manifest_path = match manifest {
            Some(path) => to_absolute(path)?,
            None => ctx.base.join(&config.core.manifest_name),
        };
        ctx.follow_symlinks = config.scan.follow_symlinks;
        ctx.diff_algorithm = config.diff.algorithm;
        Ok(ctx)
    }

    /// Stores the manifest at `path` instead of inside the base.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if `path` cannot be made absolute.
    pub fn with_manifest(mut self, path: &Path) -> Result<Self> {
        self.manifest_path = to_absolute(path)?;
        Ok(self)
    }

    /// Header a manifest for this context must carry.
    #[must_use]
    pub fn header(&self) -> Header {
        Header::new(self.base.clone(), self.file_types.clone())
    }

    /// Scanner configured for this context.
    #[must_use]
    pub fn scanner(&self) -> Scanner {
        Scanner::new(self.base.clone(), self.file_types.clone())
            .follow_symlinks(self.follow_symlinks)
            .exclude_manifest(self.manifest_path.clone())
    }

    /// Scope for a directory given on the command line, or the whole base.
    ///
    /// Relative paths are resolved against the current directory, not the base.
    /// A directory removed since the last update is still a valid scope; its
    /// fresh scan is empty.
    ///
    /// # Errors
    ///
    /// - [`PathError::OutsideBase`] if the directory is not inside the base
    /// - [`PathError::NotADirectory`] if it exists but is not a directory
    /// - [`PathError::Symlink`] if it lies behind a symlink the scanner would skip
    pub fn resolve_scope(&self, dir: Option<&Path>) -> Result<Scope> {
        let rel = match dir {
            None => RelDir::root(),
            Some(dir) => {
                let absolute = to_absolute(dir)?;
                let rel = to_relative(&absolute, &self.base)?;
                if !self.follow_symlinks {
                    self.reject_symlinks(&rel, &absolute)?;
                }
                match fs::metadata(&absolute) {
                    Ok(meta) if meta.is_dir() => {}
                    Ok(_) => return Err(PathError::NotADirectory(absolute).into()),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        debug!(scope = %rel, "Scope directory does not exist");
                    }
                    Err(e) => {
                        return Err(PathError::Unresolvable {
                            path: absolute,
                            message: e.to_string(),
                        }
                        .into());
                    }
                }
                rel
            }
        };
        Ok(Scope::new(rel, self.file_types.clone()))
    }

    /// Fails if any directory between the base and `rel` is a symlink.
    fn reject_symlinks(&self, rel: &RelDir, absolute: &Path) -> Result<()> {
        let mut path = self.base.clone();
        for segment in rel.segments() {
            path.push(segment);
            match fs::symlink_metadata(&path) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    return Err(PathError::Symlink(absolute.to_path_buf()).into());
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        Ok(())
    }
}

/// Absolute, normalised form of an existing base directory.
fn resolve_base(base: &Path) -> Result<PathBuf> {
    let base = to_absolute(base)?;
    if !base.is_dir() {
        return Err(PathError::NotADirectory(base).into());
    }
    if base.to_str().is_none() {
        return Err(PathError::NotUtf8(base).into());
    }
    Ok(base)
}
