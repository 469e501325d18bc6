//! Thin wrappers over the filesystem primitives the queue engine relies on.
//!
//! Every helper here either succeeds, reports an expected concurrent-change
//! outcome through its return value, or surfaces the OS error untouched so
//! the caller can classify it.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;
use std::time::SystemTime;

use crate::Result;

/// Create a directory, treating "already exists as a directory" as success.
///
/// Returns true if the directory was created by this call. With an explicit
/// mode the permissions are set after creation so the configured bits win
/// over the process umask.
pub(crate) fn ensure_dir(path: &Path, mode: Option<u32>) -> Result<bool> {
    match fs::create_dir(path) {
        Ok(()) => {
            if let Some(mode) = mode {
                fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
            }
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Create a directory and any missing ancestors.
pub(crate) fn create_dir_tree(path: &Path, mode: Option<u32>) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            create_dir_tree(parent, mode)?;
        }
    }
    ensure_dir(path, mode)?;
    Ok(())
}

/// Remove a directory, tolerating the two expected races: a concurrent purge
/// already removed it, or a writer just dropped a new element into it.
///
/// Returns true if the directory was removed by this call.
pub(crate) fn try_rmdir(path: &Path) -> Result<bool> {
    match fs::remove_dir(path) {
        Ok(()) => Ok(true),
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty
            ) =>
        {
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

/// Exclusive file creation, failing with `AlreadyExists` if the name is taken
/// and `NotFound` if the containing directory is missing.
pub(crate) fn create_exclusive(path: &Path, mode: Option<u32>) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    if let Some(mode) = mode {
        options.mode(mode);
    }
    let file = options.open(path)?;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(file)
}

/// Stamp the file's modification time with "now".
pub(crate) fn touch(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    file.set_modified(SystemTime::now())
}

/// A string identifying the underlying filesystem object, stable across
/// paths and processes: two handles on the same directory compare equal.
pub(crate) fn file_key(path: &Path) -> Result<String> {
    let meta = fs::metadata(path)?;
    Ok(format!("{}:{}", meta.dev(), meta.ino()))
}

/// Directory and file permission bits for a configured umask.
pub(crate) fn mode_bits(umask: u32) -> (u32, u32) {
    (0o777 & !umask, 0o666 & !umask)
}
