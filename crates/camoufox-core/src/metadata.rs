//! Installed-version metadata stored inside the install directory.
//!
//! The file is a small JSON object `{"version": ..., "release": ...}` written
//! only after a successful install, so its presence implies the directory is
//! fully populated. Optional bookkeeping fields are tolerated when absent.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::version::Version;

/// Filename of the metadata record inside the install directory.
pub const METADATA_FILE: &str = "version.json";

/// Record of what is currently installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledMetadata {
    /// Display version (browser version, e.g. `135.0.1`).
    #[serde(default)]
    pub version: String,
    /// Release identifier compared against the supported range.
    pub release: String,
    /// Asset filename the install came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

impl InstalledMetadata {
    /// Build a fresh record for `version`, stamped with the current time.
    pub fn new(version: &Version, asset: Option<String>) -> Self {
        Self {
            version: version.version().unwrap_or_default().to_string(),
            release: version.release().to_string(),
            asset,
            installed_at: Some(Utc::now()),
        }
    }

    /// Path of the metadata file inside `install_dir`.
    pub fn path(install_dir: &Path) -> PathBuf {
        install_dir.join(METADATA_FILE)
    }

    /// Whether a metadata file exists in `install_dir`.
    pub fn exists(install_dir: &Path) -> bool {
        Self::path(install_dir).is_file()
    }

    /// Parsed version of this record.
    pub fn to_version(&self) -> Version {
        let version = (!self.version.is_empty()).then(|| self.version.clone());
        Version::new(self.release.clone(), version)
    }

    /// Read the record from `install_dir`.
    ///
    /// A missing file is reported as [`FetchError::MetadataNotFound`], distinct
    /// from a present-but-unparseable file.
    pub fn read(install_dir: &Path) -> FetchResult<Self> {
        let path = Self::path(install_dir);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::MetadataNotFound { path });
            }
            Err(e) => return Err(e.into()),
        };
        let metadata: Self = serde_json::from_str(&contents)?;
        Ok(metadata)
    }

    /// Write the record into `install_dir`.
    ///
    /// The file is written under a temporary name and renamed into place so
    /// readers never observe a partial record.
    pub fn write(&self, install_dir: &Path) -> FetchResult<()> {
        let path = Self::path(install_dir);
        let tmp = install_dir.join(format!(".{METADATA_FILE}.tmp"));
        let json = serde_json::to_string_pretty(self)?;
        if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(path = %path.display(), release = %self.release, "Wrote installed metadata");
        Ok(())
    }
}
