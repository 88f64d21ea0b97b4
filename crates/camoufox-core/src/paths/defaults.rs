//! Platform default directories.
//!
//! Resolution order (highest priority first) is applied by
//! [`crate::config::FetchConfig`]: explicit override, environment variable,
//! then the defaults below.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Directory name used under the platform cache/data roots.
pub const APP_DIR_NAME: &str = "camoufox";

/// Default install directory (e.g. `~/.cache/camoufox`).
pub fn default_install_dir() -> Result<PathBuf, PathError> {
    let cache = dirs::cache_dir().ok_or(PathError::NoCacheDir)?;
    Ok(cache.join(APP_DIR_NAME))
}

/// Default data directory (e.g. `~/.local/share/camoufox`).
pub fn default_data_dir() -> Result<PathBuf, PathError> {
    let data = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data.join(APP_DIR_NAME))
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}
