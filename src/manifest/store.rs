//! Manifest file I/O.
//!
//! Reading is streaming and scope-aware: lines outside the requested scope
//! are kept verbatim, lines inside it are either kept (for a check) or
//! reduced to a fingerprint plus a splice position (for an update).
//!
//! Writing never touches the existing file in place. The new table is
//! rendered into a temporary sibling, synced, and renamed over the old one,
//! so an interrupted write leaves the previous manifest intact.

use super::{BlockFingerprint, Entry, FingerprintBuilder, HEADER_LINES, Header, Scope};
use crate::error::{HeaderField, ManifestError, Result, WriteError};
use crate::utils::paths::RelDir;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{Level, debug, info, span};

/// Suffix of temporary files written next to the manifest.
const TEMP_SUFFIX: &str = ".tmp";

/// How in-scope lines are treated by [`read_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Collapse the scope's lines into a fingerprint; they will be replaced.
    Update,
    /// Keep the scope's lines verbatim for comparison.
    Check,
}

/// What [`read_scope`] kept of the scope's own lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeBlock {
    /// Only the identity of the block, see [`ReadMode::Update`].
    Fingerprint(BlockFingerprint),
    /// The block's lines, see [`ReadMode::Check`].
    Lines(Vec<String>),
}

/// A manifest split around one scope.
///
/// `outside[..splice_at]` precede the scope's block and `outside[splice_at..]`
/// follow it. Reassembly is purely positional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedTable {
    /// Header, validated against the caller's expectation.
    pub header: Header,
    /// Body lines outside the scope, byte-identical to the file.
    pub outside: Vec<String>,
    /// Index into `outside` where the scope's block sits.
    pub splice_at: usize,
    /// The scope's block.
    pub block: ScopeBlock,
}

impl ScopedTable {
    /// Fingerprint of the stored scope block.
    #[must_use]
    pub fn block_fingerprint(&self) -> BlockFingerprint {
        match &self.block {
            ScopeBlock::Fingerprint(fingerprint) => *fingerprint,
            ScopeBlock::Lines(lines) => BlockFingerprint::of(lines.iter().map(String::as_str)),
        }
    }

    /// Stored lines of the scope, empty when read for update.
    #[must_use]
    pub fn scope_lines(&self) -> &[String] {
        match &self.block {
            ScopeBlock::Lines(lines) => lines,
            ScopeBlock::Fingerprint(_) => &[],
        }
    }
}

/// True if `name` is a temporary artifact of writing `manifest_name`.
#[must_use]
pub fn is_temp_artifact(name: &str, manifest_name: &str) -> bool {
    name.len() > manifest_name.len() + 2
        && name.starts_with('.')
        && name[1..].starts_with(manifest_name)
        && name[1 + manifest_name.len()..].starts_with('.')
        && name.ends_with(TEMP_SUFFIX)
}

/// Opens the manifest and validates its header.
fn open_table(path: &Path, expected: &Header) -> Result<(Header, Lines<BufReader<File>>)> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ManifestError::EmptyOrMissing(path.to_path_buf()).into());
        }
        Err(source) => {
            return Err(ManifestError::Read {
                path: path.to_path_buf(),
                source,
            }
            .into());
        }
    };

    let len = file
        .metadata()
        .map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len == 0 {
        return Err(ManifestError::EmptyOrMissing(path.to_path_buf()).into());
    }

    let mut lines = BufReader::new(file).lines();
    let mut header_lines = Vec::with_capacity(HEADER_LINES);
    for line_no in 1..=HEADER_LINES {
        let line = lines
            .next()
            .ok_or_else(|| ManifestError::Corrupt {
                path: path.to_path_buf(),
                line: line_no,
                reason: "truncated header".to_string(),
            })?
            .map_err(|source| ManifestError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        header_lines.push(line);
    }

    let expected_lines = expected.render();
    let fields = [
        (HeaderField::SchemaTag, 2),
        (HeaderField::BasePath, 0),
        (HeaderField::FileTypes, 1),
    ];
    for (field, idx) in fields {
        if header_lines[idx] != expected_lines[idx] {
            return Err(ManifestError::SchemaMismatch {
                path: path.to_path_buf(),
                field,
                expected: expected_lines[idx].clone(),
                found: header_lines[idx].clone(),
            }
            .into());
        }
    }

    Ok((expected.clone(), lines))
}

/// Loads and validates the manifest header.
///
/// # Errors
///
/// - [`ManifestError::EmptyOrMissing`] if the file is absent or zero-length
/// - [`ManifestError::SchemaMismatch`] if schema tag, base path or filter differ
/// - [`ManifestError::Corrupt`] if the header is truncated
pub fn load_header(path: &Path, expected: &Header) -> Result<Header> {
    let (header, _) = open_table(path, expected)?;
    Ok(header)
}

/// Reads the manifest split around `scope`.
///
/// Every body line is parsed, so a damaged table is reported here rather
/// than silently carried into the next write.
///
/// # Errors
///
/// Returns the header errors of [`load_header`], and
/// [`ManifestError::Corrupt`] for unparsable lines, a file record without a
/// preceding marker for its directory, or a scope block that is not
/// contiguous.
pub fn read_scope(
    path: &Path,
    expected: &Header,
    scope: &Scope,
    mode: ReadMode,
) -> Result<ScopedTable> {
    let span = span!(Level::DEBUG, "read_scope", path = %path.display(), scope = %scope.dir, ?mode);
    let _guard = span.enter();

    let (header, lines) = open_table(path, expected)?;

    let mut outside = Vec::new();
    let mut inside = Vec::new();
    let mut fingerprint = FingerprintBuilder::new();
    let mut first_inside: Option<usize> = None;
    let mut block_closed = false;
    let mut insert_hint: Option<usize> = None;
    let mut markers: HashSet<RelDir> = HashSet::new();

    for (idx, line) in lines.enumerate() {
        let line_no = idx + HEADER_LINES + 1;
        let corrupt = |reason: &str| ManifestError::Corrupt {
            path: path.to_path_buf(),
            line: line_no,
            reason: reason.to_string(),
        };

        let line = line.map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let entry = Entry::parse(&line).map_err(corrupt)?;

        match &entry {
            Entry::Directory { dir } => {
                markers.insert(dir.clone());
            }
            Entry::File { dir, .. } => {
                if !markers.contains(dir) {
                    return Err(corrupt("file record before its directory marker").into());
                }
            }
        }

        let dir = entry.dir();
        if scope.contains(dir) {
            if block_closed {
                return Err(corrupt("scope block is not contiguous").into());
            }
            first_inside.get_or_insert(outside.len());
            match mode {
                ReadMode::Update => fingerprint.push(&line),
                ReadMode::Check => inside.push(line),
            }
        } else {
            if first_inside.is_some() {
                block_closed = true;
            } else if insert_hint.is_none() && *dir > scope.dir {
                insert_hint = Some(outside.len());
            }
            outside.push(line);
        }
    }

    // A scope with no stored lines goes where traversal order puts it.
    let splice_at = first_inside.or(insert_hint).unwrap_or(outside.len());
    let block = match mode {
        ReadMode::Update => ScopeBlock::Fingerprint(fingerprint.finish()),
        ReadMode::Check => ScopeBlock::Lines(inside),
    };

    debug!(
        outside = outside.len(),
        splice_at, "Split manifest around scope"
    );

    Ok(ScopedTable {
        header,
        outside,
        splice_at,
        block,
    })
}

/// Writes a header-only manifest.
///
/// # Errors
///
/// Returns a [`WriteError`] if the atomic replace fails.
pub fn initialize(path: &Path, header: &Header) -> Result<()> {
    write_atomic(path, |writer| write_header(writer, header))
}

/// Replaces the manifest with `header` and `entries`.
///
/// # Errors
///
/// Returns a [`WriteError`] if the atomic replace fails; the previous
/// manifest is then untouched.
pub fn write_full(path: &Path, header: &Header, entries: &[Entry]) -> Result<()> {
    write_atomic(path, |writer| {
        write_header(writer, header)?;
        for entry in entries {
            writeln!(writer, "{}", entry.render())?;
        }
        Ok(())
    })?;
    info!(path = %path.display(), entries = entries.len(), "Wrote manifest");
    Ok(())
}

/// Replaces the manifest with `table` whose scope block is swapped for `fresh`.
///
/// # Errors
///
/// Returns a [`WriteError`] if the atomic replace fails; the previous
/// manifest is then untouched.
pub fn write_spliced(path: &Path, table: &ScopedTable, fresh: &[Entry]) -> Result<()> {
    let (before, after) = table.outside.split_at(table.splice_at.min(table.outside.len()));
    write_atomic(path, |writer| {
        write_header(writer, &table.header)?;
        for line in before {
            writeln!(writer, "{line}")?;
        }
        for entry in fresh {
            writeln!(writer, "{}", entry.render())?;
        }
        for line in after {
            writeln!(writer, "{line}")?;
        }
        Ok(())
    })?;
    info!(
        path = %path.display(),
        kept = table.outside.len(),
        spliced = fresh.len(),
        "Wrote spliced manifest"
    );
    Ok(())
}

/// Writes the three header lines.
fn write_header(writer: &mut dyn Write, header: &Header) -> io::Result<()> {
    for line in header.render() {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Renders through `render` into a temporary sibling of `path`, then renames it
/// over `path`.
fn write_atomic<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let write_error = |source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|source| WriteError::CreateTemp {
            dir: dir.to_path_buf(),
            source,
        })?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(write_error)?;
    }

    {
        let mut writer = BufWriter::new(&mut temp);
        render(&mut writer).map_err(write_error)?;
        writer.flush().map_err(write_error)?;
    }
    temp.as_file().sync_all().map_err(write_error)?;

    persist(temp, path)
}

/// Atomically moves the finished temporary file into place.
fn persist(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.persist(path).map_err(|e| WriteError::Swap {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!(path = %path.display(), "Swapped manifest into place");
    Ok(())
}
