//! Cross-platform filesystem wrapper.
//!
//! On Unix the helpers forward permission bits to the OS so extraction can
//! restore the mode recorded in the archive. Elsewhere the mode arguments are
//! accepted and ignored, and reported source modes fall back to the read-only
//! attribute.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io;
use std::path::Path;

/// Opens a compression source for reading. Directories are accepted too so the
/// walker can hold a handle on them while listing their children.
#[cfg(not(target_os = "windows"))]
pub fn open_source(path: &Path) -> io::Result<File> {
    File::open(path)
}

#[cfg(target_os = "windows")]
pub fn open_source(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    // FILE_FLAG_BACKUP_SEMANTICS, required to obtain a handle on a directory.
    const BACKUP_SEMANTICS: u32 = 0x0200_0000;
    OpenOptions::new().read(true).custom_flags(BACKUP_SEMANTICS).open(path)
}

/// Opens `path` for writing, creating or truncating it. A newly created file
/// receives `mode` (before the process umask is applied).
pub fn create_with_mode(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(path)
}

/// Recursively creates `path`. Directories that did not exist yet are created
/// with `mode`.
pub fn create_dir_all_with_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(mode & 0o7777).create(path)
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
        fs::create_dir_all(path)
    }
}

#[cfg(unix)]
/// Set POSIX permission bits on Unix.
pub fn set_unix_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
/// No-op off Unix: POSIX permission bits are not preserved.
pub fn set_unix_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Permission bits to record for a source file.
#[cfg(unix)]
pub fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
