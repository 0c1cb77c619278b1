//! # Compression Pipeline
//!
//! This module turns a list of paths into a single ZIP container.
//!
//! ## Key Features:
//! - **Lenient inputs**: top-level paths that cannot be opened are skipped.
//! - **Strict walk**: once inside a directory, any child that cannot be opened
//!   aborts the whole operation. Symbolic links below a directory are
//!   followed, so a dangling link counts as a child that cannot be opened.
//! - **Rooted names**: entries are named `prefix + "/" + base_name`, where each
//!   directory level contributes `"/" + dir_name` to the prefix. A top-level
//!   file `a.txt` is therefore stored as `/a.txt`, and `docs/readme.md` as
//!   `/docs/readme.md`. Existing consumers rely on these names.
//!
//! Only regular files become entries; directories are implied by the names of
//! the files they contain.

use std::fs::{File, Metadata};
use std::io::{self, Seek, Write};
use std::path::Path;

use chrono::{Datelike, Local, Timelike};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::common::SourceEntry;
use crate::error::{ArchiverError, Result};
use crate::fsx;

/// Files at least this large need ZIP64 headers.
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Defines the available container methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionAlgo {
    /// Deflate, readable by every ZIP tool.
    #[default]
    Deflate,
    /// Plain storage without any compression. Useful for already-compressed data.
    Store,
    /// Zstandard. Faster, but older extractors cannot read it.
    Zstd,
}

impl CompressionAlgo {
    fn method(self) -> CompressionMethod {
        match self {
            CompressionAlgo::Deflate => CompressionMethod::Deflated,
            CompressionAlgo::Store => CompressionMethod::Stored,
            CompressionAlgo::Zstd => CompressionMethod::Zstd,
        }
    }
}

/// Holds all configuration options for a compression operation.
#[derive(Debug, Clone, Default)]
pub struct CompressOptions {
    /// The method used for every entry.
    pub algo: CompressionAlgo,
}

/// Opens every path in `paths` for reading, preserving order.
///
/// Paths that cannot be opened (missing, permission denied, ...) are skipped
/// without an error.
pub fn open_all<P: AsRef<Path>>(paths: &[P]) -> Vec<SourceEntry> {
    paths
        .iter()
        .filter_map(|path| {
            let path = path.as_ref();
            match SourceEntry::open(path) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(?path, error = %e, "skipping input that cannot be opened");
                    None
                }
            }
        })
        .collect()
}

/// Compresses `paths` into a new archive at `destination`.
///
/// Inputs that do not exist are left out of the archive.
pub fn compress_paths<P: AsRef<Path>>(paths: &[P], destination: impl AsRef<Path>) -> Result<()> {
    compress_files(open_all(paths), destination)
}

/// Compresses already opened sources into a new archive at `destination`,
/// using the default options.
pub fn compress_files(sources: Vec<SourceEntry>, destination: impl AsRef<Path>) -> Result<()> {
    compress_files_with(sources, destination, &CompressOptions::default())
}

/// Compresses already opened sources into a new archive at `destination`.
///
/// The destination is created or truncated. On error the partially written
/// archive is left on disk.
pub fn compress_files_with(
    sources: Vec<SourceEntry>,
    destination: impl AsRef<Path>,
    options: &CompressOptions,
) -> Result<()> {
    let destination = destination.as_ref();
    let archive = File::create(destination).map_err(|e| ArchiverError::Io {
        source: e,
        path: destination.to_path_buf(),
    })?;

    info!(
        ?destination,
        sources = sources.len(),
        algo = ?options.algo,
        "creating ZIP archive"
    );

    let mut zip = ZipWriter::new(archive);
    for source in sources {
        compress_entry(source, &mut zip, options)?;
    }
    zip.finish()?;

    debug!(?destination, "ZIP archive finalized");
    Ok(())
}

/// Writes `source` into the archive. A directory source is walked in
/// file-name order and every file below it becomes an entry.
fn compress_entry<W: Write + Seek>(
    source: SourceEntry,
    zip: &mut ZipWriter<W>,
    options: &CompressOptions,
) -> Result<()> {
    let metadata = source.file.metadata().map_err(|e| ArchiverError::Header {
        source: e,
        path: source.path.clone(),
    })?;

    let root_prefix = format!("/{}", source.base_name());
    if !metadata.is_dir() {
        return write_file_entry(source, &metadata, root_prefix, zip, options);
    }

    let root = source.path.clone();
    drop(source);
    for entry in WalkDir::new(&root).min_depth(1).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            ArchiverError::ChildOpen { source: e.into(), path }
        })?;
        let child = SourceEntry::open(entry.path()).map_err(|e| ArchiverError::ChildOpen {
            source: e,
            path: entry.path().to_path_buf(),
        })?;
        let metadata = child.file.metadata().map_err(|e| ArchiverError::Header {
            source: e,
            path: child.path.clone(),
        })?;
        if metadata.is_dir() {
            continue;
        }
        let name = entry_name(&root_prefix, entry.path().strip_prefix(&root).unwrap_or(entry.path()));
        write_file_entry(child, &metadata, name, zip, options)?;
    }
    Ok(())
}

/// Appends each component of `relative` to `prefix`, separated by `/`.
fn entry_name(prefix: &str, relative: &Path) -> String {
    relative.components().fold(prefix.to_owned(), |mut name, component| {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
        name
    })
}

fn write_file_entry<W: Write + Seek>(
    source: SourceEntry,
    metadata: &Metadata,
    name: String,
    zip: &mut ZipWriter<W>,
    options: &CompressOptions,
) -> Result<()> {
    zip.start_file(name.as_str(), entry_options(metadata, options))
        .map_err(|e| ArchiverError::EntryCreate { source: e, name: name.clone() })?;

    let SourceEntry { path, mut file } = source;
    let written = io::copy(&mut file, zip).map_err(|e| ArchiverError::Copy { source: e, name: name.clone() })?;
    drop(file);

    debug!(?path, entry = %name, bytes = written, "added file to archive");
    Ok(())
}

fn entry_options(metadata: &Metadata, options: &CompressOptions) -> FileOptions {
    FileOptions::default()
        .compression_method(options.algo.method())
        .last_modified_time(dos_timestamp(metadata))
        .unix_permissions(fsx::permission_bits(metadata))
        .large_file(metadata.len() >= LARGE_FILE_THRESHOLD)
}

/// Modification time in local time, clamped to the DOS epoch (1980-01-01)
/// when it is unavailable or cannot be represented.
fn dos_timestamp(metadata: &Metadata) -> DateTime {
    let Ok(modified) = metadata.modified() else {
        return DateTime::default();
    };
    let local: chrono::DateTime<Local> = modified.into();
    u16::try_from(local.year())
        .ok()
        .and_then(|year| {
            DateTime::from_date_and_time(
                year,
                local.month() as u8,
                local.day() as u8,
                local.hour() as u8,
                local.minute() as u8,
                local.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}
