//! Directory creation and inspection utilities.

use std::fs;
use std::path::Path;

use super::error::PathError;

/// Create `path` (and parents) if missing.
///
/// An existing non-directory at `path` is an error.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// True when `path` is missing, is not a directory, or has no entries.
pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).map_or(true, |mut entries| entries.next().is_none())
}
