use std::io;
use std::path::PathBuf;

use zip::result::ZipError;

/// The primary error type for all operations in the `zipkit` crate.
///
/// Every variant is fatal: the operation that produced it stops immediately and
/// leaves whatever it already wrote on disk.
#[derive(Debug, thiserror::Error)]
pub enum ArchiverError {
    /// An I/O error occurred, typically while creating the archive or an output file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io { source: io::Error, path: PathBuf },

    /// A file or directory found while walking a source directory could not be opened.
    #[error("could not open '{}' while walking its parent directory: {source}", .path.display())]
    ChildOpen { source: io::Error, path: PathBuf },

    /// The metadata needed to build an entry header could not be read.
    #[error("could not read metadata for '{}': {source}", .path.display())]
    Header { source: io::Error, path: PathBuf },

    /// The archive writer refused to start a new entry.
    #[error("could not create archive entry '{name}': {source}")]
    EntryCreate { source: ZipError, name: String },

    /// Streaming the content of an entry failed on either the read or the write side.
    #[error("failed to copy content of '{name}': {source}")]
    Copy { source: io::Error, name: String },

    /// The archive is missing, unreadable or not a valid ZIP container.
    #[error("could not open archive '{}': {source}", .path.display())]
    ArchiveOpen { source: ZipError, path: PathBuf },

    /// A single entry record inside an otherwise readable archive is broken.
    #[error("could not read archive entry #{index}: {source}")]
    EntryRead { source: ZipError, index: usize },

    /// A parent directory for an extracted file could not be created.
    #[error("failed to create directory '{}': {source}", .path.display())]
    DirectoryCreate { source: io::Error, path: PathBuf },

    /// Finalizing the archive (central directory) failed.
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
}

// Generic IO error conversion that doesn't require a path
impl From<io::Error> for ArchiverError {
    fn from(err: io::Error) -> Self {
        ArchiverError::Io { source: err, path: PathBuf::new() }
    }
}

pub type Result<T> = std::result::Result<T, ArchiverError>;
