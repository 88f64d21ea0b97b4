//! Network and filesystem adapters for the Camoufox package manager.
//!
//! This crate implements the pieces that talk to the outside world:
//!
//! - [`http`]: the [`HttpBackend`] seam and its reqwest implementation
//! - [`downloader`]: retrying streamed downloads into a [`DownloadSink`]
//! - [`resolver`]: release feed lookup and asset selection
//! - [`installer`]: archive extraction with rollback
//! - [`lock`]: the cross-process install lock
//! - [`path_resolver`]: the [`PathResolver`] entry point used by launchers
//!
//! # Feature Flags
//!
//! - `cli`: enables [`CliProgress`] terminal progress bars via `indicatif`.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tracing_subscriber as _;
// Permission fixes after extraction only run on unix
#[cfg(not(unix))]
use walkdir as _;

pub mod downloader;
pub mod http;
pub mod installer;
pub mod lock;
pub mod path_resolver;
#[cfg(feature = "cli")]
pub mod progress;
pub mod resolver;

pub use downloader::{DownloadSink, Downloader};
pub use http::{ByteStream, HttpBackend, HttpResponse, ReqwestBackend};
pub use installer::{ArchiveFormat, ArchiveInstaller};
pub use lock::{InstallLock, LOCK_FILE};
pub use path_resolver::{DefaultPathResolver, PathResolver};
#[cfg(feature = "cli")]
pub use progress::CliProgress;
pub use resolver::{CamoufoxAssetMatcher, ReleaseAsset, ReleaseAssetResolver};

// Re-export core types so launchers only need one dependency
pub use camoufox_core::{
    ConfigOverrides, FetchConfig, FetchError, FetchResult, InstalledMetadata, NoopProgress,
    ProgressReporter, SupportedRange, TargetPlatform, Version,
};
