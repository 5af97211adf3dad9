use crate::error::PathError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A directory relative to the manifest's base, stored as parsed segments.
///
/// Renders with a leading `./`; the base itself renders as `./`. Segments
/// never contain `..`, `.` or a separator. Ordering compares segment lists
/// lexically, which is exactly the depth-first traversal order the scanner
/// emits directories in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RelDir {
    segments: Vec<String>,
}

impl RelDir {
    /// The base directory itself (`./`).
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses the rendered form (`./` or `./a/b`).
    ///
    /// Returns `None` for anything that would escape the base or is not in
    /// rendered form.
    #[must_use]
    pub fn parse(rendered: &str) -> Option<Self> {
        let rest = rendered.strip_prefix("./")?;
        if rest.is_empty() {
            return Some(Self::root());
        }
        let mut segments = Vec::new();
        for segment in rest.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return None;
            }
            segments.push(segment.to_string());
        }
        Some(Self { segments })
    }

    /// Returns a child directory.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// True when `self` is `scope` or lies below it, compared segment by segment.
    #[must_use]
    pub fn is_within(&self, scope: &Self) -> bool {
        self.segments.starts_with(&scope.segments)
    }

    /// True for `./`.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path segments below the base.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves this directory against `base`.
    #[must_use]
    pub fn to_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for RelDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "./{}", self.segments.join("/"))
    }
}

/// Lexically normalizes a path: drops `.` and folds `..` into its parent.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Makes a path absolute against the current directory and normalizes it.
///
/// Symlinks are not resolved, so the same tree reached through two mount
/// points produces two different bases.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn to_absolute(path: &Path) -> Result<PathBuf, PathError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let current_dir = std::env::current_dir().map_err(|e| PathError::Unresolvable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        current_dir.join(path)
    };
    Ok(normalize_lexically(&absolute))
}

/// Expresses an absolute directory relative to `base`.
///
/// # Errors
///
/// Returns [`PathError::OutsideBase`] if `absolute` is neither `base` nor a
/// descendant of it, and [`PathError::NotUtf8`] if a segment cannot be
/// stored as text.
pub fn to_relative(absolute: &Path, base: &Path) -> Result<RelDir, PathError> {
    let absolute = normalize_lexically(absolute);
    let base = normalize_lexically(base);
    let rest = absolute
        .strip_prefix(&base)
        .map_err(|_| PathError::OutsideBase {
            path: absolute.clone(),
            base: base.clone(),
        })?;

    let mut rel = RelDir::root();
    for component in rest.components() {
        match component {
            Component::Normal(name) => {
                let name = name
                    .to_str()
                    .ok_or_else(|| PathError::NotUtf8(absolute.clone()))?;
                rel.segments.push(name.to_string());
            }
            Component::CurDir => {}
            _ => {
                return Err(PathError::OutsideBase {
                    path: absolute.clone(),
                    base: base.clone(),
                });
            }
        }
    }
    Ok(rel)
}
