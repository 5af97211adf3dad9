//! Line-level comparison of a stored scope block against a fresh scan.
//!
//! Both sides are compared as sequences of rendered table lines, so a file
//! counts as changed when any of its directory, name, time or hash differ.
//! A modification therefore shows up as a `removed` line followed by an
//! `added` line rather than as a separate tag.

use crate::manifest::{Entry, Scope};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt;
use tracing::{Level, debug, span};

/// Convert `DiffAlgorithm` config enum to `similar::Algorithm`
#[must_use]
pub const fn config_to_algorithm(algo: &crate::config::DiffAlgorithm) -> Algorithm {
    match algo {
        crate::config::DiffAlgorithm::Lcs => Algorithm::Lcs,
        crate::config::DiffAlgorithm::Myers => Algorithm::Myers,
        crate::config::DiffAlgorithm::Patience => Algorithm::Patience,
    }
}

/// Direction of a changed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Present only in the fresh scan.
    Added,
    /// Present only in the stored manifest.
    Removed,
}

/// One changed table line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Whether the line appeared or disappeared.
    pub kind: ChangeKind,
    /// The rendered table line.
    pub line: String,
}

impl Change {
    /// Parsed form of the line, if it is a well-formed record.
    #[must_use]
    pub fn entry(&self) -> Option<Entry> {
        Entry::parse(&self.line).ok()
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.kind {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
        };
        write!(f, "{sign} {}", self.line)
    }
}

/// Counts of changed lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Lines only in the fresh scan.
    pub added: usize,
    /// Lines only in the stored manifest.
    pub removed: usize,
}

impl DiffSummary {
    /// Counts the lines of `changes` by kind.
    #[must_use]
    pub fn of(changes: &[Change]) -> Self {
        changes.iter().fold(Self::default(), |mut summary, change| {
            match change.kind {
                ChangeKind::Added => summary.added += 1,
                ChangeKind::Removed => summary.removed += 1,
            }
            summary
        })
    }
}

/// Outcome of comparing a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeReport {
    /// Stored and fresh lines are identical.
    Unchanged,
    /// Changed lines in diff order, restricted to the scope.
    Changed(Vec<Change>),
}

impl ChangeReport {
    /// True if nothing changed.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Changed lines, empty when unchanged.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        match self {
            Self::Unchanged => &[],
            Self::Changed(changes) => changes,
        }
    }

    /// Consume the report, returning its changed lines.
    #[must_use]
    pub fn into_changes(self) -> Vec<Change> {
        match self {
            Self::Unchanged => Vec::new(),
            Self::Changed(changes) => changes,
        }
    }

    /// Added/removed line counts.
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::of(self.changes())
    }
}

/// Compares stored against fresh lines of `scope`.
///
/// When `force` is false, textually identical inputs short-circuit to
/// [`ChangeReport::Unchanged`] without running the diff. Every reported
/// line is re-checked against the scope on its parsed directory, so a line
/// for `./Folder2` can never leak into a report for `./Folder`.
#[must_use]
pub fn diff(
    stored: &[String],
    fresh: &[String],
    scope: &Scope,
    algorithm: Algorithm,
    force: bool,
) -> ChangeReport {
    let span = span!(Level::DEBUG, "diff", scope = %scope.dir, ?algorithm, force);
    let _guard = span.enter();

    if !force && stored == fresh {
        debug!(lines = stored.len(), "Scope unchanged");
        return ChangeReport::Unchanged;
    }

    let old: Vec<&str> = stored.iter().map(String::as_str).collect();
    let new: Vec<&str> = fresh.iter().map(String::as_str).collect();
    let text_diff = TextDiff::configure()
        .algorithm(algorithm)
        .diff_slices(old.as_slice(), new.as_slice());

    let changes: Vec<Change> = text_diff
        .iter_all_changes()
        .filter_map(|change| {
            let kind = match change.tag() {
                ChangeTag::Insert => ChangeKind::Added,
                ChangeTag::Delete => ChangeKind::Removed,
                ChangeTag::Equal => return None,
            };
            Some(Change {
                kind,
                line: change.value().to_string(),
            })
        })
        .filter(|change| {
            change
                .entry()
                .is_some_and(|entry| scope.contains(entry.dir()))
        })
        .collect();

    debug!(changes = changes.len(), "Diff complete");

    if changes.is_empty() {
        ChangeReport::Unchanged
    } else {
        ChangeReport::Changed(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileTypeFilter;
    use crate::utils::paths::RelDir;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn root_scope() -> Scope {
        Scope::new(RelDir::root(), FileTypeFilter::All)
    }

    #[test]
    fn test_identical_is_unchanged() {
        let stored = lines(&["./,,,", "./,f1.txt,t1,h1"]);
        let report = diff(&stored, &stored.clone(), &root_scope(), Algorithm::Lcs, false);
        assert!(report.is_unchanged());

        let forced = diff(&stored, &stored.clone(), &root_scope(), Algorithm::Lcs, true);
        assert!(forced.is_unchanged());
    }

    #[test]
    fn test_modification_is_removed_then_added() {
        let stored = lines(&["./,,,", "./,f1.txt,t1,h1"]);
        let fresh = lines(&["./,,,", "./,f1.txt,t2,h2"]);
        let report = diff(&stored, &fresh, &root_scope(), Algorithm::Lcs, false);

        assert_eq!(
            report.changes(),
            &[
                Change {
                    kind: ChangeKind::Removed,
                    line: "./,f1.txt,t1,h1".to_string()
                },
                Change {
                    kind: ChangeKind::Added,
                    line: "./,f1.txt,t2,h2".to_string()
                },
            ]
        );
        assert_eq!(
            report.summary(),
            DiffSummary {
                added: 1,
                removed: 1
            }
        );
    }

    #[test]
    fn test_removal_has_no_added_line() {
        let stored = lines(&["./,,,", "./,f1.txt,t1,h1"]);
        let fresh = lines(&["./,,,"]);
        let report = diff(&stored, &fresh, &root_scope(), Algorithm::Myers, false);

        assert_eq!(report.summary(), DiffSummary { added: 0, removed: 1 });
        assert_eq!(report.changes()[0].line, "./,f1.txt,t1,h1");
    }

    #[test]
    fn test_lines_outside_scope_are_dropped() {
        let scope = Scope::new(RelDir::parse("./Folder").unwrap(), FileTypeFilter::All);
        let stored = lines(&["./Folder,,,", "./Folder2,,,", "./Folder2,x,t,h"]);
        let fresh = lines(&["./Folder,,,", "./Folder,new,t,h"]);
        let report = diff(&stored, &fresh, &scope, Algorithm::Lcs, false);

        assert_eq!(
            report.changes(),
            &[Change {
                kind: ChangeKind::Added,
                line: "./Folder,new,t,h".to_string()
            }]
        );
    }

    #[test]
    fn test_only_out_of_scope_changes_is_unchanged() {
        let scope = Scope::new(RelDir::parse("./Folder").unwrap(), FileTypeFilter::All);
        let stored = lines(&["./Folder,,,", "./Folder2,,,"]);
        let fresh = lines(&["./Folder,,,"]);
        assert!(diff(&stored, &fresh, &scope, Algorithm::Lcs, false).is_unchanged());
    }

    #[test]
    fn test_change_display() {
        let change = Change {
            kind: ChangeKind::Removed,
            line: "./,a,t,h".to_string(),
        };
        assert_eq!(change.to_string(), "- ./,a,t,h");
    }
}
