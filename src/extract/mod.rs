//! # Extraction Module
//!
//! Expands a ZIP container into a directory tree. Two entry points exist and
//! both are in use:
//!
//! - [`extract_with_progress`] re-decodes legacy (GB18030) entry names,
//!   reports progress after every entry and releases each entry's handles as
//!   soon as the entry is written.
//! - [`extract_all`] writes entry names exactly as their stored bytes,
//!   creates the destination root up front and keeps its output handles open
//!   until the whole archive has been written.
//!
//! Entry names are joined below the destination root without any sanitizing:
//! `..` segments are honored as-is.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::archive::{ArchiveEntry, EntryName};
use crate::error::{ArchiverError, Result};
use crate::fsx;
use crate::progress::{ProgressCallback, ProgressTracker};

/// Size of the buffer used to stream entry content to disk.
pub const COPY_CHUNK_SIZE: usize = 100 * 1024;

/// Mode for directories created by [`extract_with_progress`] (before umask).
const PERMISSIVE_DIR_MODE: u32 = 0o777;
/// Mode for directories created by [`extract_all`].
const DEFAULT_DIR_MODE: u32 = 0o755;
/// Mode for files whose entry records none.
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Computes where an entry named `name` is written below `root`.
///
/// Entry names always use `/`. Empty and `.` segments are dropped, so the
/// leading separator of names like `/docs/readme.md` keeps the entry below
/// `root`.
pub fn destination_path(root: &Path, name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in name.split('/') {
        match segment {
            "" | "." => continue,
            segment => path.push(segment),
        }
    }
    path
}

/// Like [`destination_path`], but joins the entry name exactly as stored,
/// without any character set conversion.
#[cfg(unix)]
pub fn raw_destination_path(root: &Path, raw_name: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let mut path = root.to_path_buf();
    for segment in raw_name.split(|&b| b == b'/') {
        match segment {
            b"" | b"." => continue,
            segment => path.push(OsStr::from_bytes(segment)),
        }
    }
    path
}

/// Raw bytes cannot name a file portably off Unix; the name as decoded by the
/// container library is used instead.
#[cfg(not(unix))]
pub fn raw_destination_path(root: &Path, raw_name: &[u8]) -> PathBuf {
    destination_path(root, &String::from_utf8_lossy(raw_name))
}

fn open_archive(archive_path: &Path) -> Result<ZipArchive<File>> {
    let to_err = |source: ZipError| ArchiverError::ArchiveOpen {
        source,
        path: archive_path.to_path_buf(),
    };
    let file = File::open(archive_path).map_err(|e| to_err(ZipError::Io(e)))?;
    ZipArchive::new(file).map_err(to_err)
}

/// Extracts `archive_path` into `dest_dir`, decoding legacy entry names and
/// reporting progress.
///
/// `on_progress` receives `(total_entries, index)` after each entry (directory
/// or file) is complete. An archive without entries reports `(0, 0)` once.
///
/// Failing to create a directory *entry* is ignored; failing to create the
/// parent directories of a *file* entry aborts the extraction.
pub fn extract_with_progress<'a>(
    archive_path: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    on_progress: Option<&'a mut ProgressCallback<'a>>,
) -> Result<()> {
    let archive_path = archive_path.as_ref();
    let dest_dir = dest_dir.as_ref();
    let mut archive = open_archive(archive_path)?;

    let total = archive.len();
    let mut progress = ProgressTracker::new(total, on_progress);
    if total == 0 {
        progress.report_empty();
        return Ok(());
    }

    info!(?archive_path, ?dest_dir, entries = total, "extracting ZIP archive");

    for index in 0..total {
        let mut file = archive
            .by_index(index)
            .map_err(|source| ArchiverError::EntryRead { source, index })?;
        let entry = ArchiveEntry::decoded(&file);
        if entry.name.is_legacy() {
            match &entry.name {
                EntryName::Garbled(name) => {
                    warn!(index, entry = %name, "entry name is not valid GB18030, using lossy decoding")
                }
                name => debug!(index, entry = %name, "decoded legacy entry name as GB18030"),
            }
        }

        let target = destination_path(dest_dir, entry.name.as_str());
        if entry.is_dir {
            if let Err(e) = fsx::create_dir_all_with_mode(&target, PERMISSIVE_DIR_MODE) {
                debug!(?target, error = %e, "ignoring failure to create directory entry");
            }
        } else {
            if let Some(parent) = target.parent() {
                fsx::create_dir_all_with_mode(parent, PERMISSIVE_DIR_MODE).map_err(|e| {
                    ArchiverError::DirectoryCreate { source: e, path: parent.to_path_buf() }
                })?;
            }
            let mode = entry.permission_bits(DEFAULT_FILE_MODE);
            let mut output = fsx::create_with_mode(&target, mode)
                .map_err(|e| ArchiverError::Io { source: e, path: target.clone() })?;
            copy_in_chunks(&mut file, &mut output).map_err(|e| ArchiverError::Copy {
                source: e,
                name: entry.name.to_string(),
            })?;
            fsx::set_unix_permissions(&target, mode)
                .map_err(|e| ArchiverError::Io { source: e, path: target.clone() })?;
        }
        drop(file);

        progress.record_entry(index);
    }

    debug!(?archive_path, entries = total, "ZIP extraction complete");
    Ok(())
}

/// Extracts `archive_path` into `dest_dir` without name decoding or progress.
///
/// Entry names are used as raw bytes, whatever their encoding. `dest_dir` is
/// created first (mode 0755). Output files stay open until every entry has
/// been written.
pub fn extract_all(archive_path: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<()> {
    let archive_path = archive_path.as_ref();
    let dest_dir = dest_dir.as_ref();
    let mut archive = open_archive(archive_path)?;

    fsx::create_dir_all_with_mode(dest_dir, DEFAULT_DIR_MODE).map_err(|e| {
        ArchiverError::DirectoryCreate { source: e, path: dest_dir.to_path_buf() }
    })?;

    info!(?archive_path, ?dest_dir, entries = archive.len(), "extracting ZIP archive");

    let mut outputs: Vec<File> = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|source| ArchiverError::EntryRead { source, index })?;
        let entry = ArchiveEntry::undecoded(&file);
        let target = raw_destination_path(dest_dir, file.name_raw());

        if entry.is_dir {
            let mode = entry.permission_bits(DEFAULT_DIR_MODE);
            if let Err(e) = fsx::create_dir_all_with_mode(&target, mode) {
                debug!(?target, error = %e, "ignoring failure to create directory entry");
            }
            continue;
        }

        // Only a parent that is known to be missing is created. Any other
        // lookup failure shows up when the file itself is created.
        if let Some(parent) = target.parent() {
            match fs::metadata(parent) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    fsx::create_dir_all_with_mode(parent, DEFAULT_DIR_MODE).map_err(|e| {
                        ArchiverError::DirectoryCreate { source: e, path: parent.to_path_buf() }
                    })?;
                }
                Err(e) => debug!(?parent, error = %e, "parent lookup failed, not creating it"),
                Ok(_) => {}
            }
        }

        let mode = entry.permission_bits(DEFAULT_FILE_MODE);
        let mut output = fsx::create_with_mode(&target, mode)
            .map_err(|e| ArchiverError::Io { source: e, path: target.clone() })?;
        io::copy(&mut file, &mut output).map_err(|e| ArchiverError::Copy {
            source: e,
            name: entry.name.to_string(),
        })?;
        fsx::set_unix_permissions(&target, mode)
            .map_err(|e| ArchiverError::Io { source: e, path: target.clone() })?;
        outputs.push(output);
    }

    debug!(?archive_path, released = outputs.len(), "ZIP extraction complete");
    Ok(())
}

/// Lists the entries of an archive without extracting anything.
///
/// Names are classified and decoded the same way [`extract_with_progress`]
/// does.
pub fn list_entries(archive_path: impl AsRef<Path>) -> Result<Vec<ArchiveEntry>> {
    let mut archive = open_archive(archive_path.as_ref())?;
    (0..archive.len())
        .map(|index| {
            archive
                .by_index_raw(index)
                .map(|file| ArchiveEntry::decoded(&file))
                .map_err(|source| ArchiverError::EntryRead { source, index })
        })
        .collect()
}

/// Streams `reader` into `writer` through a [`COPY_CHUNK_SIZE`] buffer until
/// end of stream. The first read or write error is returned.
pub(crate) fn copy_in_chunks<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}
