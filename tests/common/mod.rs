#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use dirsum::DirsumContext;
use dirsum::scanner::FileTypeFilter;
use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fixed mtime for every fixture file.
pub const MTIME: i64 = 1_700_000_000;

/// Directory tree fixture with a manifest inside its base
pub struct TestTree {
    pub temp_dir: TempDir,
}

impl TestTree {
    /// Create an empty tree
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Tree with root files, nested directories and a prefix-sharing sibling
    pub fn sample() -> Result<Self> {
        let tree = Self::new()?;
        tree.write("f1.txt", "one")?;
        tree.write("photo.JPG", "jpeg bytes")?;
        tree.write("Folder/a.txt", "a")?;
        tree.write("Folder/sub/b.txt", "b")?;
        tree.write("Folder2/c.txt", "c")?;
        tree.write("odd, name \"quoted\" 100%.txt", "odd")?;
        Ok(tree)
    }

    /// Base directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the tree
    pub fn join(&self, rel: &str) -> PathBuf {
        self.path().join(rel)
    }

    /// Default manifest location
    pub fn manifest(&self) -> PathBuf {
        self.join(dirsum::DEFAULT_MANIFEST_NAME)
    }

    /// Write a file with the fixture mtime
    pub fn write(&self, rel: &str, content: &str) -> Result<()> {
        self.write_at(rel, content, MTIME)
    }

    /// Write a file with an explicit mtime
    pub fn write_at(&self, rel: &str, content: &str, mtime: i64) -> Result<()> {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        set_file_mtime(&path, FileTime::from_unix_time(mtime, 0))?;
        Ok(())
    }

    /// Library context for this tree with every file type
    pub fn ctx(&self) -> Result<DirsumContext> {
        Ok(DirsumContext::new(self.path(), FileTypeFilter::All)?)
    }

    /// The binary, pointed at this tree and isolated from user configuration
    pub fn cmd(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("dirsum")?;
        cmd.env("DIRSUM_CONFIG", self.join("no-such-config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .arg("-C")
            .arg(self.path());
        Ok(cmd)
    }
}
