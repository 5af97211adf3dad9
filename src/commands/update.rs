//! Manifest creation and scoped refresh.
//!
//! A refresh replaces only the scope's block; a deleted scope directory
//! leaves an empty block, which prunes its stored lines.

use crate::manifest::store::{self, ReadMode};
use crate::manifest::FingerprintBuilder;
use crate::utils::paths::RelDir;
use crate::{DirsumContext, Error, Result, error::ManifestError};
use std::fmt;
use std::path::Path;
use tracing::{Level, info, span};

/// Why an update did or did not write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    /// No manifest existed; the whole base was scanned and written.
    Created,
    /// The scope's block differed and was replaced.
    Updated,
    /// The scope's block was replaced on request, changed or not.
    Forced,
    /// The scope's block already matched the tree.
    NothingToUpdate,
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "manifest created",
            Self::Updated => "manifest updated",
            Self::Forced => "manifest rewritten (forced)",
            Self::NothingToUpdate => "nothing to update",
        })
    }
}

/// Outcome of [`execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Whether the manifest file was replaced.
    pub written: bool,
    /// What the update did.
    pub reason: UpdateReason,
    /// Entries scanned for the scope (the whole base when created).
    pub scanned: usize,
}

/// Creates the manifest or refreshes the block of `scope_dir`.
///
/// Without a manifest the whole base is scanned regardless of `scope_dir`.
/// Otherwise the header is validated, the scope re-scanned and, unless the
/// rendered block is identical and `force` is unset, spliced in place.
/// Nothing is written if any part of the scan fails.
///
/// # Errors
///
/// - [`crate::error::PathError`] if `scope_dir` is outside the base or exists but is not a directory
/// - [`ManifestError`] if the existing manifest does not match or is corrupt
/// - [`crate::error::ScanError`] on the first unreadable file or directory
/// - [`crate::error::WriteError`] if the atomic replace fails
pub fn execute(ctx: &DirsumContext, scope_dir: Option<&Path>, force: bool) -> Result<UpdateResult> {
    let scope = ctx.resolve_scope(scope_dir)?;
    let span = span!(Level::INFO, "update", scope = %scope.dir, force);
    let _guard = span.enter();

    let header = ctx.header();
    let path = &ctx.manifest_path;
    let scanner = ctx.scanner();

    match store::load_header(path, &header) {
        Ok(_) => {}
        Err(Error::Manifest(ManifestError::EmptyOrMissing(_))) => {
            info!(path = %path.display(), "No manifest yet, scanning whole base");
            let entries = scanner.scan(&RelDir::root())?;
            store::write_full(path, &header, &entries)?;
            return Ok(UpdateResult {
                written: true,
                reason: UpdateReason::Created,
                scanned: entries.len(),
            });
        }
        Err(e) => return Err(e),
    }

    let table = store::read_scope(path, &header, &scope, ReadMode::Update)?;
    let fresh = scanner.scan(&scope.dir)?;

    let mut fingerprint = FingerprintBuilder::new();
    for entry in &fresh {
        fingerprint.push(&entry.render());
    }

    if !force && fingerprint.finish() == table.block_fingerprint() {
        info!(entries = fresh.len(), "Scope unchanged, manifest left untouched");
        return Ok(UpdateResult {
            written: false,
            reason: UpdateReason::NothingToUpdate,
            scanned: fresh.len(),
        });
    }

    store::write_spliced(path, &table, &fresh)?;
    Ok(UpdateResult {
        written: true,
        reason: if force {
            UpdateReason::Forced
        } else {
            UpdateReason::Updated
        },
        scanned: fresh.len(),
    })
}
