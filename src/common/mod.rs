//! Common types shared by the compression side.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::fsx;

/// An input to the compressor: the path it was opened from plus the open handle.
///
/// The path is kept because a directory handle alone cannot name its children.
/// Dropping the value closes the handle.
#[derive(Debug)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub file: File,
}

impl SourceEntry {
    /// Opens `path` for reading. Works for both regular files and directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = fsx::open_source(path)?;
        Ok(Self { path: path.to_path_buf(), file })
    }

    /// The last path component, used as the entry name (files) or the prefix
    /// segment (directories). Paths without a final component, such as `.` or
    /// `..`, are used verbatim.
    pub fn base_name(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.path.to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn base_name_of_file_and_dot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"x").unwrap();
        let entry = SourceEntry::open(&path).unwrap();
        assert_eq!(entry.base_name(), "notes.txt");

        let here = SourceEntry::open(".").unwrap();
        assert_eq!(here.base_name(), ".");
    }

    #[test]
    fn open_missing_path_fails() {
        let dir = tempdir().unwrap();
        assert!(SourceEntry::open(dir.path().join("nope")).is_err());
    }
}
