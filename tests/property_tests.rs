use dirsum::diff::{self, ChangeKind};
use dirsum::manifest::{Entry, Scope};
use dirsum::scanner::FileTypeFilter;
use dirsum::utils::fields::{escape_field, render_record, split_record, unescape_field};
use dirsum::utils::paths::RelDir;
use proptest::prelude::*;
use similar::Algorithm;

/// Directory segments from a small alphabet so prefixes collide often.
fn segment() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["A", "A2", "AB", "B", "Folder", "Folder2", "a b", "x,y"])
        .prop_map(ToString::to_string)
}

fn rel_dir() -> impl Strategy<Value = RelDir> {
    prop::collection::vec(segment(), 0..4).prop_map(|segments| {
        segments
            .iter()
            .fold(RelDir::root(), |dir, segment| dir.join(segment))
    })
}

fn entry() -> impl Strategy<Value = Entry> {
    (rel_dir(), prop::option::of(("[a-z%,\" ]{1,8}", "[0-9a-f]{4}"))).prop_map(
        |(dir, file)| match file {
            None => Entry::Directory { dir },
            Some((name, hash)) => Entry::File {
                dir,
                name,
                time: "2024-01-01 00:00:00.000000000 +0000".to_string(),
                hash,
            },
        },
    )
}

proptest! {
    #[test]
    fn test_escape_round_trip(raw in ".*") {
        // Invariant: escaping is lossless
        prop_assert_eq!(unescape_field(&escape_field(&raw)), raw);
    }

    #[test]
    fn test_record_round_trip(fields in prop::collection::vec("[^\r\n]*", 4)) {
        // Invariant: a rendered line splits back into the same fields
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        let line = render_record(&refs);
        prop_assert_eq!(split_record(&line).unwrap(), fields);
    }

    #[test]
    fn test_entry_round_trip(entry in entry()) {
        prop_assert_eq!(Entry::parse(&entry.render()).unwrap(), entry);
    }

    #[test]
    fn test_containment_is_segment_based(dir in rel_dir(), scope in rel_dir()) {
        // Invariant: containment agrees with segment prefixes, never string prefixes
        let expected = dir.segments().starts_with(scope.segments());
        prop_assert_eq!(dir.is_within(&scope), expected);
        prop_assert!(dir.is_within(&RelDir::root()));
    }

    #[test]
    fn test_diff_reports_only_in_scope_lines(
        stored in prop::collection::vec(entry(), 0..20),
        fresh in prop::collection::vec(entry(), 0..20),
        scope_dir in rel_dir(),
    ) {
        // Invariant: whatever the inputs, no reported line escapes the scope
        let scope = Scope::new(scope_dir, FileTypeFilter::All);
        let stored: Vec<String> = stored.iter().map(Entry::render).collect();
        let fresh: Vec<String> = fresh.iter().map(Entry::render).collect();

        let report = diff::diff(&stored, &fresh, &scope, Algorithm::Lcs, false);
        for change in report.changes() {
            let entry = Entry::parse(&change.line).unwrap();
            prop_assert!(scope.contains(entry.dir()));
            match change.kind {
                ChangeKind::Added => prop_assert!(fresh.contains(&change.line)),
                ChangeKind::Removed => prop_assert!(stored.contains(&change.line)),
            }
        }
    }
}
