//! Error types for fetching, installing and locating Camoufox.
//!
//! This module provides a unified error type for the whole package manager
//! so orchestration code never has to juggle adapter-specific errors. Foreign
//! errors (HTTP client, archive readers) are captured as strings at the
//! adapter boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::paths::PathError;

/// Errors that can occur while resolving, downloading or installing a release.
#[derive(Debug, Error)]
pub enum FetchError {
    // === Platform ===
    /// The running operating system has no release mapping.
    #[error("Unsupported operating system: {os}")]
    UnsupportedOs { os: String },

    /// The architecture has no mapping, or is not published for this OS.
    #[error("Unsupported architecture {arch} for {os}")]
    UnsupportedArchitecture { arch: String, os: String },

    // === Release feed ===
    /// The whole feed was scanned without a supported matching asset.
    #[error(
        "No matching release found for {os} {arch} in {repo} within the supported range ({range}). \
         Please update the Camoufox client library."
    )]
    MissingRelease {
        os: String,
        arch: String,
        repo: String,
        range: String,
    },

    /// The feed response could not be interpreted.
    #[error("Invalid release feed response: {0}")]
    InvalidFeed(String),

    // === Installation ===
    /// The installed-metadata file does not exist.
    #[error("Version information not found at {path}. Please reinstall Camoufox.")]
    MetadataNotFound { path: PathBuf },

    /// Installed metadata parses but falls outside the supported range.
    #[error(
        "Installed Camoufox version {version} is not supported ({range}). Please update Camoufox."
    )]
    UnsupportedVersion { version: String, range: String },

    /// The install directory or its executable is missing.
    #[error("Camoufox is not installed at {path}. Please install it before launching.")]
    NotInstalled { path: PathBuf },

    /// A release lookup or download was requested while updates are disabled.
    #[error("Fetching Camoufox releases is disabled (CAMOUFOX_SKIP_UPDATE is set)")]
    UpdatesDisabled,

    /// The archive could not be read or unpacked.
    #[error("Failed to extract archive: {0}")]
    Archive(String),

    // === Network ===
    /// Every download attempt failed.
    #[error("Download failed after {attempts} attempts: {url} ({reason})")]
    DownloadFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP request failed with status {status}: {url}")]
    Http { status: u16, url: String },

    /// Transport-level failure (connection, TLS, body stream).
    #[error("Network error: {0}")]
    Network(String),

    // === Path & IO ===
    /// Default or override directory could not be resolved.
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Create a `Network` error from any displayable error.
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    /// Create an `Archive` error from any displayable error.
    pub fn archive(err: impl std::fmt::Display) -> Self {
        Self::Archive(err.to_string())
    }

    /// Whether this error means "nothing usable is installed" rather than a
    /// hard failure.
    pub const fn is_not_installed(&self) -> bool {
        matches!(
            self,
            Self::NotInstalled { .. } | Self::MetadataNotFound { .. }
        )
    }
}

/// Result type alias for package manager operations
pub type FetchResult<T> = Result<T, FetchError>;
