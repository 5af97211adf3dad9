//! User configuration, read from a TOML file.
//!
//! Values here are defaults only; command-line flags override them and the
//! merged result is frozen into a [`crate::DirsumContext`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "DIRSUM_CONFIG";

/// Default configuration path relative to the platform config directory.
pub const DEFAULT_CONFIG_PATH: &str = "dirsum/config.toml";

/// Contents of `config.toml`; every section may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// `[core]`: manifest location, filter and logging
    #[serde(default)]
    pub core: CoreConfig,

    /// `[scan]`: traversal behaviour
    #[serde(default)]
    pub scan: ScanConfig,

    /// `[diff]`: how check compares lines
    #[serde(default)]
    pub diff: DiffConfig,
}

/// The `[core]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Manifest file name inside the base directory, used without `--manifest`
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
    /// Default file-type filter (`*` or a comma-separated extension list)
    #[serde(default = "default_file_types")]
    pub file_types: String,
    /// Side file receiving the log
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// The `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanConfig {
    /// Descend into symlinked directories and record symlinked files
    #[serde(default)]
    pub follow_symlinks: bool,
}

/// The `[diff]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiffConfig {
    /// Line diff algorithm
    #[serde(default)]
    pub algorithm: DiffAlgorithm,
}

/// Line diff algorithm used by check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    /// Longest common subsequence.
    #[default]
    Lcs,
    /// Myers' O(ND) algorithm.
    Myers,
    /// Patience diff.
    Patience,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            manifest_name: default_manifest_name(),
            file_types: default_file_types(),
            log_file: None,
        }
    }
}

impl Config {
    /// Location of the configuration file: `$DIRSUM_CONFIG`, else the
    /// platform config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from a file
    ///
    /// A missing file yields the defaults; nothing is created on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let name = self.core.manifest_name.trim();
        if name.is_empty() {
            anyhow::bail!("core.manifest_name must not be empty");
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            anyhow::bail!("core.manifest_name must be a plain file name, got `{name}`");
        }
        if self.core.file_types.contains(['\n', '\r']) {
            anyhow::bail!("core.file_types must be a single line");
        }
        Ok(())
    }
}

// Default functions for serde
/// Manifest name used when `[core]` omits one.
fn default_manifest_name() -> String {
    ".dirsum.csv".to_string()
}

/// Filter used when `[core]` omits one: every file.
fn default_file_types() -> String {
    "*".to_string()
}
