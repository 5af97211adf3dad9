//! One body line of the table.

use crate::utils::fields::{render_record, split_record};
use crate::utils::paths::RelDir;

/// A body record: a directory marker or a file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// `<reldir>,,,`
    Directory {
        /// The directory.
        dir: RelDir,
    },
    /// `<reldir>,<filename>,<time>,<hash>`
    File {
        /// Directory holding the file.
        dir: RelDir,
        /// File name, without directory.
        name: String,
        /// Modification time, see [`crate::utils::time::TIME_FORMAT`].
        time: String,
        /// Lowercase hex content digest.
        hash: String,
    },
}

impl Entry {
    /// Directory this record belongs to.
    #[must_use]
    pub const fn dir(&self) -> &RelDir {
        match self {
            Self::Directory { dir } | Self::File { dir, .. } => dir,
        }
    }

    /// Renders the record as one table line (no trailing newline).
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Directory { dir } => render_record(&[&dir.to_string(), "", "", ""]),
            Self::File {
                dir,
                name,
                time,
                hash,
            } => render_record(&[&dir.to_string(), name, time, hash]),
        }
    }

    /// Parses a rendered table line.
    ///
    /// # Errors
    ///
    /// Returns a short reason if the line is not a well-formed record.
    pub fn parse(line: &str) -> Result<Self, &'static str> {
        let fields = split_record(line)?;
        let [dir, name, time, hash]: [String; 4] = fields
            .try_into()
            .map_err(|_| "expected 4 fields")?;
        let dir = RelDir::parse(&dir).ok_or("invalid relative directory")?;

        match (name.is_empty(), time.is_empty(), hash.is_empty()) {
            (true, true, true) => Ok(Self::Directory { dir }),
            (false, false, false) => Ok(Self::File {
                dir,
                name,
                time,
                hash,
            }),
            _ => Err("file record with empty fields"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marker() {
        let entry = Entry::Directory {
            dir: RelDir::root(),
        };
        assert_eq!(entry.render(), "./,,,");
    }

    #[test]
    fn test_render_file_record() {
        let entry = Entry::File {
            dir: RelDir::root(),
            name: "f1.txt".to_string(),
            time: "t1".to_string(),
            hash: "h1".to_string(),
        };
        assert_eq!(entry.render(), "./,f1.txt,t1,h1");
    }

    #[test]
    fn test_parse_inverts_render() {
        let entry = Entry::File {
            dir: RelDir::root().join("a, b"),
            name: "50% \"off\".pdf".to_string(),
            time: "2024-01-01 00:00:00.000000000 +0000".to_string(),
            hash: "0123456789abcdef0123456789abcdef".to_string(),
        };
        assert_eq!(Entry::parse(&entry.render()).unwrap(), entry);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Entry::parse("./,a,b").is_err());
        assert!(Entry::parse("docs,,,").is_err());
        assert!(Entry::parse("./../x,,,").is_err());
        assert!(Entry::parse("./,name,,").is_err());
        assert!(Entry::parse("").is_err());
    }
}
