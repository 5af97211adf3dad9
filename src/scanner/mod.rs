//! Directory scanner producing table entries for a scope.
//!
//! Directories are visited depth-first in lexical order of their path
//! segments. Each directory yields one marker followed by its matching files
//! in file-name order, so a scope's entries always come out as one
//! contiguous, deterministically ordered block.

/// File-type filtering by extension
pub mod filter;

pub use filter::FileTypeFilter;

use crate::error::ScanError;
use crate::manifest::Entry;
use crate::utils::paths::RelDir;
use crate::utils::{hash, time};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{Level, debug, info, span};
use walkdir::WalkDir;

/// Supplies the content hash and modification time of a file.
///
/// Two calls on identical bytes must return identical hashes; the digest is
/// otherwise opaque to the table.
pub trait FileInspector {
    /// Content digest as lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn hash(&self, path: &Path) -> io::Result<String>;

    /// Modification time formatted for the TIME column.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    fn mod_time(&self, path: &Path) -> io::Result<String>;
}

/// Default inspector: streaming XXH3-128 and UTC nanosecond timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Inspector;

impl FileInspector for Xxh3Inspector {
    fn hash(&self, path: &Path) -> io::Result<String> {
        hash::hash_file(path)
    }

    fn mod_time(&self, path: &Path) -> io::Result<String> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(time::format_mtime(modified))
    }
}

/// Scanner for one base directory.
pub struct Scanner<I = Xxh3Inspector> {
    /// Directory all relative paths are computed against
    base: PathBuf,
    /// Which files get a record
    file_types: FileTypeFilter,
    /// Whether to descend into symlinked directories and record symlinked files
    follow_symlinks: bool,
    /// Manifest file, never recorded along with its temporary siblings
    manifest: Option<PathBuf>,
    /// Hash and timestamp source
    inspector: I,
}

impl Scanner<Xxh3Inspector> {
    /// Create a scanner with the default inspector.
    #[must_use]
    pub const fn new(base: PathBuf, file_types: FileTypeFilter) -> Self {
        Self {
            base,
            file_types,
            follow_symlinks: false,
            manifest: None,
            inspector: Xxh3Inspector,
        }
    }
}

impl<I: FileInspector> Scanner<I> {
    /// Replace the hash and timestamp source.
    #[must_use]
    pub fn with_inspector<J: FileInspector>(self, inspector: J) -> Scanner<J> {
        Scanner {
            base: self.base,
            file_types: self.file_types,
            follow_symlinks: self.follow_symlinks,
            manifest: self.manifest,
            inspector,
        }
    }

    /// Follow symbolic links while walking.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Never record the manifest itself or its temporary write artifacts.
    #[must_use]
    pub fn exclude_manifest(mut self, manifest: PathBuf) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Scan `scope`, aborting on the first unreadable entry.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScanError`] encountered.
    pub fn scan(&self, scope: &RelDir) -> Result<Vec<Entry>, ScanError> {
        self.walk(scope, &mut |e| Err(e))
    }

    /// Scan `scope`, collecting unreadable entries instead of aborting.
    ///
    /// The returned entries are incomplete whenever the error list is not
    /// empty, so they must never be written to a manifest.
    #[must_use]
    pub fn scan_lenient(&self, scope: &RelDir) -> (Vec<Entry>, Vec<ScanError>) {
        let mut errors = Vec::new();
        let entries = self
            .walk(scope, &mut |e| {
                errors.push(e);
                Ok(())
            })
            .unwrap_or_default();
        (entries, errors)
    }

    /// Walk the scope; `sink` decides whether an error aborts the walk.
    fn walk(
        &self,
        scope: &RelDir,
        sink: &mut dyn FnMut(ScanError) -> Result<(), ScanError>,
    ) -> Result<Vec<Entry>, ScanError> {
        let root = scope.to_path(&self.base);
        let span = span!(Level::DEBUG, "scan", scope = %scope, root = %root.display());
        let _guard = span.enter();

        let mut entries = Vec::new();
        let mut files_recorded = 0usize;

        match fs::metadata(&root) {
            Err(e) if e.kind() == io::ErrorKind::NotFound && !scope.is_root() => {
                debug!("Scope no longer exists, nothing to scan");
                return Ok(entries);
            }
            _ => {}
        }

        // The root may itself be a symlink; walkdir always descends into it.
        let mut it = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_type().is_dir());

        while let Some(next) = it.next() {
            let dir_entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    sink(walk_error(e, &root))?;
                    continue;
                }
            };

            let Some(dir) = relative_dir(scope, &root, dir_entry.path()) else {
                sink(ScanError::UnrepresentableName(dir_entry.path().to_path_buf()))?;
                it.skip_current_dir();
                continue;
            };

            debug!(dir = %dir, "scanning directory");
            entries.push(Entry::Directory { dir: dir.clone() });

            let files = match self.list_files(dir_entry.path()) {
                Ok(files) => files,
                Err(e) => {
                    sink(e)?;
                    it.skip_current_dir();
                    continue;
                }
            };

            for path in files {
                match self.record(&dir, &path) {
                    Ok(Some(entry)) => {
                        files_recorded += 1;
                        entries.push(entry);
                    }
                    Ok(None) => {}
                    Err(e) => sink(e)?,
                }
            }
        }

        info!(
            scope = %scope,
            entries = entries.len(),
            files = files_recorded,
            "Scan complete"
        );

        Ok(entries)
    }

    /// Regular files directly inside `dir`, sorted by name.
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let read_dir = fs::read_dir(dir).map_err(|source| ScanError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| ScanError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| ScanError::File {
                path: path.clone(),
                source,
            })?;

            let is_file = if file_type.is_symlink() {
                // Broken links have no target to record.
                self.follow_symlinks && fs::metadata(&path).is_ok_and(|m| m.is_file())
            } else {
                file_type.is_file()
            };

            if is_file && !self.is_excluded(&path) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Builds the record for one file, or `None` if the filter rejects it.
    fn record(&self, dir: &RelDir, path: &Path) -> Result<Option<Entry>, ScanError> {
        if !self.file_types.matches(path) {
            return Ok(None);
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| is_representable(n))
            .ok_or_else(|| ScanError::UnrepresentableName(path.to_path_buf()))?;

        let file_error = |source| ScanError::File {
            path: path.to_path_buf(),
            source,
        };
        let time = self.inspector.mod_time(path).map_err(file_error)?;
        let hash = self.inspector.hash(path).map_err(file_error)?;

        Ok(Some(Entry::File {
            dir: dir.clone(),
            name: name.to_string(),
            time,
            hash,
        }))
    }

    /// True for the manifest and for temporary files written next to it.
    fn is_excluded(&self, path: &Path) -> bool {
        let Some(manifest) = &self.manifest else {
            return false;
        };
        if path == manifest {
            return true;
        }
        let (Some(name), Some(manifest_name)) = (
            path.file_name().and_then(|n| n.to_str()),
            manifest.file_name().and_then(|n| n.to_str()),
        ) else {
            return false;
        };
        path.parent() == manifest.parent()
            && crate::manifest::store::is_temp_artifact(name, manifest_name)
    }
}

/// Names with line breaks cannot be stored one record per line.
fn is_representable(name: &str) -> bool {
    !name.contains(['\n', '\r'])
}

/// Relative directory of `path`, which lies below the scope's `root`.
fn relative_dir(scope: &RelDir, root: &Path, path: &Path) -> Option<RelDir> {
    let rest = path.strip_prefix(root).ok()?;
    let mut dir = scope.clone();
    for component in rest.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().filter(|n| is_representable(n))?;
                dir = dir.join(name);
            }
            _ => return None,
        }
    }
    Some(dir)
}

/// Converts a walkdir failure into a [`ScanError`].
fn walk_error(error: walkdir::Error, root: &Path) -> ScanError {
    let path = error.path().unwrap_or(root).to_path_buf();
    let source = error
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
    ScanError::Directory { path, source }
}
