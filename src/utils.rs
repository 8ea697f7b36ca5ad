//! Filesystem helpers for the object store
//!
//! ## Atomic Writes
//!
//! Object files must never be observable in a half-written state, because the
//! store treats "a file exists at this path" as "this object is stored". Writes
//! therefore go to a uniquely named temporary file in the destination
//! directory and are renamed into place only once complete. The temporary
//! file is removed automatically on every failure path.
//!
//! ## Cross-Platform Compatibility
//!
//! Permission bits are applied on Unix and ignored elsewhere.

use crate::error::{GroveError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::trace;

/// Atomic file write (write to temp file then rename)
///
/// Either the whole of `content` ends up at `path` with permission bits
/// `mode`, or nothing does.
///
/// # Errors
///
/// - [`GroveError::Io`] if creating, writing or renaming the temporary file fails
pub fn atomic_write(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| GroveError::validation(format!("{} has no parent directory", path.display())))?;

    let mut temp = NamedTempFile::new_in(dir)
        .map_err(|e| GroveError::io(format!("creating temp file in {}", dir.display()), e))?;
    temp.write_all(content)
        .map_err(|e| GroveError::io(format!("writing {}", temp.path().display()), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| GroveError::io(format!("syncing {}", temp.path().display()), e))?;
    set_permissions(temp.path(), mode)?;

    temp.persist(path)
        .map_err(|e| GroveError::io(format!("renaming into {}", path.display()), e.error))?;

    trace!("Atomically wrote {} bytes to {:?}", content.len(), path);
    Ok(())
}

/// Create `path` and any missing parents with permission bits `mode`
#[cfg(unix)]
pub fn create_dir_all(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .map_err(|e| GroveError::io(format!("creating directory {}", path.display()), e))
}

/// Create `path` and any missing parents (Windows implementation)
#[cfg(not(unix))]
pub fn create_dir_all(path: &Path, _mode: u32) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| GroveError::io(format!("creating directory {}", path.display()), e))
}

/// Set Unix permissions
#[cfg(unix)]
pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| GroveError::io(format!("setting permissions on {}", path.display()), e))
}

/// Set permissions (no-op outside Unix)
#[cfg(not(unix))]
pub fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
