use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which files a scan records, by extension.
///
/// Extensions are stored trimmed, without a leading dot, lowercased and
/// sorted, so the rendered header line is canonical regardless of how the
/// user spelled the list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileTypeFilter {
    /// Every file (`*`).
    #[default]
    All,
    /// Only files whose extension is in the set.
    Extensions(BTreeSet<String>),
}

impl FileTypeFilter {
    /// Builds a filter from a list of extensions; an empty list or `*` means all.
    #[must_use]
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for ext in extensions {
            let ext = ext.as_ref().trim();
            if ext == "*" {
                return Self::All;
            }
            let ext = ext.trim_start_matches('.').to_lowercase();
            if !ext.is_empty() {
                set.insert(ext);
            }
        }
        if set.is_empty() {
            Self::All
        } else {
            Self::Extensions(set)
        }
    }

    /// True if a file at `path` should be recorded.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::All => true,
            Self::Extensions(set) => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| set.contains(&e.to_lowercase())),
        }
    }
}

impl fmt::Display for FileTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Extensions(set) => {
                let joined: Vec<&str> = set.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl FromStr for FileTypeFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_extensions(s.split(',')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_everything() {
        let filter: FileTypeFilter = "*".parse().unwrap();
        assert_eq!(filter, FileTypeFilter::All);
        assert!(filter.matches(Path::new("a.txt")));
        assert!(filter.matches(Path::new("Makefile")));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let filter: FileTypeFilter = "jpg,PNG".parse().unwrap();
        assert!(filter.matches(Path::new("IMG_001.JPG")));
        assert!(filter.matches(Path::new("shot.png")));
        assert!(!filter.matches(Path::new("notes.txt")));
        assert!(!filter.matches(Path::new("jpg")));
    }

    #[test]
    fn test_rendering_is_canonical() {
        let a: FileTypeFilter = " .PNG, jpg,png".parse().unwrap();
        let b: FileTypeFilter = "jpg,png".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "jpg,png");
        assert_eq!(FileTypeFilter::All.to_string(), "*");
    }

    #[test]
    fn test_empty_list_means_all() {
        let filter: FileTypeFilter = "".parse().unwrap();
        assert_eq!(filter, FileTypeFilter::All);
    }
}
