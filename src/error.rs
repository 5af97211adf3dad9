//! Typed errors for the manifest core.
//!
//! Every fallible core operation returns [`Result`]. The four families map
//! one-to-one onto the failure modes of an update or check run, and the
//! binary derives its exit code from the family (see [`Error::exit_code`]).

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the core.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Exit code of a check that found changes.
pub const EXIT_CHANGED: i32 = 1;
/// Exit code for [`ManifestError`].
pub const EXIT_MANIFEST: i32 = 2;
/// Exit code for [`PathError`].
pub const EXIT_PATH: i32 = 3;
/// Exit code for [`ScanError`], also used when a keep-going check skipped entries.
pub const EXIT_SCAN: i32 = 4;
/// Exit code for [`WriteError`].
pub const EXIT_WRITE: i32 = 5;
/// Exit code for configuration and any other failure.
pub const EXIT_OTHER: i32 = 6;

/// A path could not be expressed relative to the base directory.
#[derive(Debug, Error)]
pub enum PathError {
    /// Path lies outside the base directory.
    #[error("{path} is not inside base directory {base}")]
    OutsideBase {
        /// Offending path.
        path: PathBuf,
        /// Base directory it should be within.
        base: PathBuf,
    },

    /// Path could not be resolved to an absolute form.
    #[error("cannot resolve {path}: {message}")]
    Unresolvable {
        /// Offending path.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },

    /// Scope exists but is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// Scope lies behind a symlink while symlinks are not followed.
    #[error("{0} is reached through a symbolic link; enable scan.follow_symlinks to use it")]
    Symlink(PathBuf),

    /// Path component is not valid UTF-8 and cannot be stored in the table.
    #[error("path is not valid UTF-8: {0}")]
    NotUtf8(PathBuf),
}

/// The header field that disagreed with the caller's expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// Line 1, the base directory.
    BasePath,
    /// Line 2, the file-type filter.
    FileTypes,
    /// Line 3, the column layout tag.
    SchemaTag,
}

impl std::fmt::Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BasePath => "base path",
            Self::FileTypes => "file-type filter",
            Self::SchemaTag => "schema tag",
        })
    }
}

/// The manifest is absent or does not belong to this invocation.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No manifest file, or a zero-length one.
    #[error("manifest {0} is missing or empty; run `dirsum update` first")]
    EmptyOrMissing(PathBuf),

    /// Header does not match the current base, filter or schema.
    #[error("manifest {path}: {field} mismatch (expected `{expected}`, found `{found}`)")]
    SchemaMismatch {
        /// Manifest file.
        path: PathBuf,
        /// Which header line disagreed.
        field: HeaderField,
        /// Value the caller expected.
        expected: String,
        /// Value stored in the manifest.
        found: String,
    },

    /// Header truncated or a body line cannot be parsed.
    #[error("manifest {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        /// Manifest file.
        path: PathBuf,
        /// One-based physical line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Reading the manifest failed.
    #[error("failed to read manifest {path}: {source}")]
    Read {
        /// Manifest file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A file or directory could not be read during traversal.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Directory listing failed.
    #[error("cannot read directory {path}: {source}")]
    Directory {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File metadata or content could not be read.
    #[error("cannot read file {path}: {source}")]
    File {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Name contains a line break and cannot be stored one-record-per-line.
    #[error("cannot record {0}: name contains a line break")]
    UnrepresentableName(PathBuf),
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Directory { path, .. } | Self::File { path, .. } => path,
            Self::UnrepresentableName(path) => path,
        }
    }
}

/// The atomic replace of the manifest could not complete.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Temporary file could not be created next to the manifest.
    #[error("cannot create temporary file in {dir}: {source}")]
    CreateTemp {
        /// Directory holding the manifest.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or syncing the temporary file failed.
    #[error("cannot write temporary manifest for {path}: {source}")]
    Write {
        /// Target manifest.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Renaming the temporary file over the manifest failed.
    #[error("cannot replace manifest {path}: {source}")]
    Swap {
        /// Target manifest.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Any failure of the manifest core.
#[derive(Debug, Error)]
pub enum Error {
    /// See [`PathError`].
    #[error(transparent)]
    Path(#[from] PathError),
    /// See [`ManifestError`].
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// See [`ScanError`].
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// See [`WriteError`].
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl Error {
    /// Process exit code for this failure family.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Manifest(_) => EXIT_MANIFEST,
            Self::Path(_) => EXIT_PATH,
            Self::Scan(_) => EXIT_SCAN,
            Self::Write(_) => EXIT_WRITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors: Vec<Error> = vec![
            ManifestError::EmptyOrMissing(PathBuf::from("m")).into(),
            PathError::NotADirectory(PathBuf::from("p")).into(),
            ScanError::UnrepresentableName(PathBuf::from("s")).into(),
            WriteError::Swap {
                path: PathBuf::from("w"),
                source: std::io::Error::other("x"),
            }
            .into(),
        ];
        let codes: Vec<i32> = errors.iter().map(Error::exit_code).collect();
        assert_eq!(codes, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_schema_mismatch_message_names_field() {
        let err = ManifestError::SchemaMismatch {
            path: PathBuf::from("table.csv"),
            field: HeaderField::BasePath,
            expected: "/data".to_string(),
            found: "/other".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("base path mismatch"));
        assert!(msg.contains("/data"));
        assert!(msg.contains("/other"));
    }
}
