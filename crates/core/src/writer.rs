//! All-or-nothing text writes.
//!
//! Text goes to a hidden temp file beside the target first and is then
//! renamed into place, so a failed write never leaves a partial file.

use crate::error::{Result, ScratchError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `text` to a path that must not exist yet.
///
/// Fails with an `AlreadyExists` I/O error if something claimed the path
/// since it was chosen; see [`ScratchError::is_already_exists`].
pub fn write_new(path: &Path, text: &str) -> Result<()> {
    let tmp = stage(path, text)?;
    tmp.persist_noclobber(path)
        .map_err(|e| ScratchError::io(path, e.error))?;
    Ok(())
}

/// Replaces the contents of `path`, creating it if needed.
pub fn overwrite(path: &Path, text: &str) -> Result<()> {
    let tmp = stage(path, text)?;
    tmp.persist(path).map_err(|e| ScratchError::io(path, e.error))?;
    Ok(())
}

fn stage(path: &Path, text: &str) -> Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ScratchError::io(dir, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| ScratchError::io(tmp.path(), e))?;
    Ok(tmp)
}
