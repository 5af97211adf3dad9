//! The on-disk table of file identities.
//!
//! A manifest is a text file: three header lines (base directory, file-type
//! filter, column layout tag) followed by one record per line in depth-first
//! traversal order. Because a directory and its descendants always form one
//! contiguous block, an update can swap out a single scope's block and leave
//! every other line byte-identical.
//!
//! ```text
//! /data/photos
//! jpg,png
//! RELDIR,FILENAME,TIME,HASH
//! ./,,,
//! ./,cover.jpg,2024-05-01 10:00:00.000000000 +0000,9f2c...
//! ./2024,,,
//! ```

/// Body record codec
pub mod entry;
/// Reading, splicing and atomically writing manifest files
pub mod store;

pub use entry::Entry;
pub use store::{ReadMode, ScopeBlock, ScopedTable};

use crate::scanner::FileTypeFilter;
use crate::utils::paths::RelDir;
use std::path::PathBuf;
use xxhash_rust::xxh3::Xxh3;

/// Column layout tag stored on header line 3.
pub const SCHEMA_TAG: &str = "RELDIR,FILENAME,TIME,HASH";

/// Number of physical header lines.
pub const HEADER_LINES: usize = 3;

/// Manifest header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Absolute directory all relative paths are computed against.
    pub base_path: PathBuf,
    /// Filter the table was recorded with.
    pub file_types: FileTypeFilter,
}

impl Header {
    /// Create a header.
    #[must_use]
    pub const fn new(base_path: PathBuf, file_types: FileTypeFilter) -> Self {
        Self {
            base_path,
            file_types,
        }
    }

    /// The three header lines, in file order.
    #[must_use]
    pub fn render(&self) -> [String; HEADER_LINES] {
        [
            self.base_path.display().to_string(),
            self.file_types.to_string(),
            SCHEMA_TAG.to_string(),
        ]
    }
}

/// The part of the table an update or check may read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Top directory of the scope.
    pub dir: RelDir,
    /// Filter in force.
    pub file_types: FileTypeFilter,
}

impl Scope {
    /// Create a scope.
    #[must_use]
    pub const fn new(dir: RelDir, file_types: FileTypeFilter) -> Self {
        Self { dir, file_types }
    }

    /// True if a record for `dir` belongs to this scope.
    #[must_use]
    pub fn contains(&self, dir: &RelDir) -> bool {
        dir.is_within(&self.dir)
    }
}

/// Identity of a block of rendered lines without keeping the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFingerprint {
    /// Number of lines.
    pub lines: usize,
    /// XXH3-128 over every line followed by `\n`.
    pub digest: u128,
}

/// Incremental builder for a [`BlockFingerprint`].
#[derive(Clone, Default)]
pub struct FingerprintBuilder {
    /// Running hash
    hasher: Xxh3,
    /// Lines fed so far
    lines: usize,
}

impl FingerprintBuilder {
    /// Start an empty fingerprint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one rendered line.
    pub fn push(&mut self, line: &str) {
        self.hasher.update(line.as_bytes());
        self.hasher.update(b"\n");
        self.lines += 1;
    }

    /// Finish the fingerprint.
    #[must_use]
    pub fn finish(&self) -> BlockFingerprint {
        BlockFingerprint {
            lines: self.lines,
            digest: self.hasher.digest128(),
        }
    }
}

impl BlockFingerprint {
    /// Fingerprint of a sequence of rendered lines.
    #[must_use]
    pub fn of<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = FingerprintBuilder::new();
        for line in lines {
            builder.push(line);
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_render() {
        let header = Header::new(PathBuf::from("/data"), "png,jpg".parse().unwrap());
        assert_eq!(
            header.render(),
            [
                "/data".to_string(),
                "jpg,png".to_string(),
                "RELDIR,FILENAME,TIME,HASH".to_string()
            ]
        );
    }

    #[test]
    fn test_scope_contains() {
        let scope = Scope::new(RelDir::parse("./Folder").unwrap(), FileTypeFilter::All);
        assert!(scope.contains(&RelDir::parse("./Folder/a").unwrap()));
        assert!(!scope.contains(&RelDir::parse("./Folder2").unwrap()));
        assert!(!scope.contains(&RelDir::root()));
    }

    #[test]
    fn test_fingerprint_sensitivity() {
        let a = BlockFingerprint::of(["./,,,", "./,a,t,h"]);
        let b = BlockFingerprint::of(["./,,,", "./,a,t,h"]);
        let c = BlockFingerprint::of(["./,,,", "./,a,t,h2"]);
        let joined = BlockFingerprint::of(["./,,,\n./,a,t,h"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, joined);
        assert_eq!(BlockFingerprint::of([]).lines, 0);
    }
}
