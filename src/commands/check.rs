//! Read-only verification of a scope against the manifest.

use crate::diff::{self, Change, ChangeKind, DiffSummary, config_to_algorithm};
use crate::error::ScanError;
use crate::manifest::Entry;
use crate::manifest::store::{self, ReadMode};
use crate::{DirsumContext, Result};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span, warn};

/// Outcome of [`execute`].
#[derive(Debug)]
pub struct CheckResult {
    /// True if any in-scope line was added or removed.
    pub changed: bool,
    /// Changed lines in diff order.
    pub changes: Vec<Change>,
    /// Counts of `changes`.
    pub summary: DiffSummary,
    /// Unreadable entries skipped in keep-going mode; always empty otherwise.
    pub scan_errors: Vec<ScanError>,
}

/// Compares the tree under `scope_dir` against the manifest. Never writes.
///
/// With `keep_going`, unreadable files and directories are collected into
/// [`CheckResult::scan_errors`] instead of aborting, and stored lines below
/// them are not reported as removed since their state is unknown.
///
/// # Errors
///
/// - [`crate::error::PathError`] if `scope_dir` is outside the base or exists but is not a directory
/// - [`crate::error::ManifestError`] if the manifest is missing, mismatched or corrupt
/// - [`ScanError`] on the first unreadable entry, unless `keep_going`
pub fn execute(
    ctx: &DirsumContext,
    scope_dir: Option<&Path>,
    force: bool,
    keep_going: bool,
) -> Result<CheckResult> {
    let scope = ctx.resolve_scope(scope_dir)?;
    let span = span!(Level::INFO, "check", scope = %scope.dir, force, keep_going);
    let _guard = span.enter();

    let table = store::read_scope(&ctx.manifest_path, &ctx.header(), &scope, ReadMode::Check)?;

    let scanner = ctx.scanner();
    let (fresh, scan_errors) = if keep_going {
        scanner.scan_lenient(&scope.dir)
    } else {
        (scanner.scan(&scope.dir)?, Vec::new())
    };
    for e in &scan_errors {
        warn!(path = %e.path().display(), error = %e, "Skipped unreadable entry");
    }

    let fresh_lines: Vec<String> = fresh.iter().map(Entry::render).collect();
    let report = diff::diff(
        table.scope_lines(),
        &fresh_lines,
        &scope,
        config_to_algorithm(&ctx.diff_algorithm),
        force,
    );

    let mut changes = report.into_changes();
    if !scan_errors.is_empty() {
        let failed: Vec<PathBuf> = scan_errors.iter().map(|e| e.path().to_path_buf()).collect();
        let before = changes.len();
        changes.retain(|change| !is_unverifiable(change, &ctx.base, &failed));
        debug!(dropped = before - changes.len(), "Dropped lines below unreadable entries");
    }

    let summary = DiffSummary::of(&changes);
    info!(added = summary.added, removed = summary.removed, "Check complete");

    Ok(CheckResult {
        changed: !changes.is_empty(),
        changes,
        summary,
        scan_errors,
    })
}

/// True for a removed line whose file or directory sits at or below a path
/// the scan could not read.
fn is_unverifiable(change: &Change, base: &Path, failed: &[PathBuf]) -> bool {
    if change.kind != ChangeKind::Removed {
        return false;
    }
    let Some(entry) = change.entry() else {
        return false;
    };
    let path = match &entry {
        Entry::Directory { dir } => dir.to_path(base),
        Entry::File { dir, name, .. } => dir.to_path(base).join(name),
    };
    failed.iter().any(|f| path.starts_with(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::commands::test_support::{MTIME, sample_tree, write_file};
    use crate::commands::update;
    use crate::error::{HeaderField, ManifestError};
    use crate::utils::hash::hash_bytes;
    use filetime::{FileTime, set_file_mtime};
    use std::fs;

    #[test]
    fn test_unchanged_tree() -> Result<()> {
        let (_temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;
        let before = fs::read(&ctx.manifest_path).unwrap();

        let result = execute(&ctx, None, false, false)?;
        assert!(!result.changed);
        assert!(result.changes.is_empty());
        assert_eq!(fs::read(&ctx.manifest_path).unwrap(), before);

        let forced = execute(&ctx, None, true, false)?;
        assert!(!forced.changed);
        Ok(())
    }

    #[test]
    fn test_detects_modification() -> Result<()> {
        let (temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;

        let path = temp.path().join("f1.txt");
        fs::write(&path, "two").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(MTIME + 60, 0)).unwrap();

        let result = execute(&ctx, None, false, false)?;
        assert!(result.changed);
        assert_eq!(
            result.summary,
            DiffSummary {
                added: 1,
                removed: 1
            }
        );
        assert_eq!(result.changes[0].kind, ChangeKind::Removed);
        assert_eq!(
            result.changes[0].line,
            format!(
                "./,f1.txt,2023-11-14 22:13:20.000000000 +0000,{}",
                hash_bytes(b"one")
            )
        );
        assert_eq!(result.changes[1].kind, ChangeKind::Added);
        assert_eq!(
            result.changes[1].line,
            format!(
                "./,f1.txt,2023-11-14 22:14:20.000000000 +0000,{}",
                hash_bytes(b"two")
            )
        );
        Ok(())
    }

    #[test]
    fn test_touch_without_content_change_is_reported() -> Result<()> {
        let (temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;

        let path = temp.path().join("Folder/a.txt");
        set_file_mtime(&path, FileTime::from_unix_time(MTIME + 1, 0)).unwrap();

        let result = execute(&ctx, None, false, false)?;
        assert_eq!(
            result.summary,
            DiffSummary {
                added: 1,
                removed: 1
            }
        );
        Ok(())
    }

    #[test]
    fn test_detects_removal() -> Result<()> {
        let (temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;
        fs::remove_file(temp.path().join("f1.txt")).unwrap();

        let result = execute(&ctx, None, false, false)?;
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].kind, ChangeKind::Removed);
        assert!(result.changes[0].line.starts_with("./,f1.txt,"));
        Ok(())
    }

    #[test]
    fn test_scope_excludes_prefix_sibling() -> Result<()> {
        let (temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;

        write_file(temp.path(), "Folder2/added.txt", "x");
        fs::remove_file(temp.path().join("f1.txt")).unwrap();

        let result = execute(&ctx, Some(&temp.path().join("Folder")), false, false)?;
        assert!(!result.changed);

        write_file(temp.path(), "Folder/sub/added.txt", "y");
        let result = execute(&ctx, Some(&temp.path().join("Folder")), false, false)?;
        assert_eq!(result.changes.len(), 1);
        assert!(result.changes[0].line.starts_with("./Folder/sub,added.txt,"));
        Ok(())
    }

    #[test]
    fn test_new_directory_is_added() -> Result<()> {
        let (temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;
        fs::create_dir(temp.path().join("Empty")).unwrap();

        let result = execute(&ctx, None, false, false)?;
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].line, "./Empty,,,");
        assert_eq!(result.changes[0].kind, ChangeKind::Added);
        Ok(())
    }

    #[test]
    fn test_deleted_scope_reports_its_block_as_removed() -> Result<()> {
        let (temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;
        fs::remove_dir_all(temp.path().join("Folder")).unwrap();

        let result = execute(&ctx, Some(&temp.path().join("Folder")), false, false)?;
        assert_eq!(
            result.summary,
            DiffSummary {
                added: 0,
                removed: 4
            }
        );
        assert_eq!(result.changes[0].line, "./Folder,,,");
        assert_eq!(result.changes[2].line, "./Folder/sub,,,");

        let sub = execute(&ctx, Some(&temp.path().join("Folder/sub")), false, true)?;
        assert_eq!(sub.summary.removed, 2);
        assert!(sub.scan_errors.is_empty());

        assert!(!execute(&ctx, Some(&temp.path().join("Folder2")), false, false)?.changed);
        Ok(())
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let (_temp, ctx) = sample_tree();
        let err = execute(&ctx, None, false, false).unwrap_err();
        assert!(matches!(
            err,
            Error::Manifest(ManifestError::EmptyOrMissing(_))
        ));
        assert!(!ctx.manifest_path.exists());
    }

    #[test]
    fn test_header_mismatch() -> Result<()> {
        let (_temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;

        let moved = tempfile::TempDir::new().unwrap();
        write_file(moved.path(), "f1.txt", "one");
        let mut other = crate::DirsumContext::new(moved.path(), ctx.file_types.clone())?;
        other.manifest_path = ctx.manifest_path.clone();
        let before = fs::read(&ctx.manifest_path).unwrap();

        let err = execute(&other, None, false, false).unwrap_err();
        assert!(matches!(
            err,
            Error::Manifest(ManifestError::SchemaMismatch {
                field: HeaderField::BasePath,
                ..
            })
        ));
        assert_eq!(fs::read(&ctx.manifest_path).unwrap(), before);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_keep_going_collects_errors() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let (temp, ctx) = sample_tree();
        update::execute(&ctx, None, false)?;

        let locked = temp.path().join("Folder/a.txt");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&locked).is_ok() {
            // Running as root; permissions are not enforced.
            return Ok(());
        }
        fs::remove_file(temp.path().join("f1.txt")).unwrap();

        let strict = execute(&ctx, None, false, false);
        let lenient = execute(&ctx, None, false, true);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(matches!(strict, Err(Error::Scan(_))));
        let lenient = lenient?;
        assert_eq!(lenient.scan_errors.len(), 1);
        assert_eq!(lenient.scan_errors[0].path(), locked.as_path());
        assert_eq!(lenient.changes.len(), 1);
        assert!(lenient.changes[0].line.starts_with("./,f1.txt,"));
        Ok(())
    }
}
