//! Core domain types for the Camoufox package manager.
//!
//! This crate holds everything that does not touch the network or archive
//! formats: release version ordering, the supported range, platform tables,
//! configuration, default paths, installed metadata and the port traits
//! implemented by `camoufox-fetch`.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod metadata;
pub mod paths;
pub mod platform;
pub mod ports;
pub mod version;

// Re-export commonly used types for convenience
pub use config::{
    ConfigOverrides, ENV_DATA_DIR, ENV_GITHUB_TOKEN, ENV_INSTALL_DIR, ENV_SKIP_UPDATE,
    FetchConfig,
};
pub use error::{FetchError, FetchResult};
pub use metadata::{InstalledMetadata, METADATA_FILE};
pub use paths::PathError;
pub use platform::{ArchName, OsName, TargetPlatform};
pub use ports::{
    AssetMatcher, FeedAsset, FeedRelease, NoopProgress, ProgressReporter, find_first_match,
};
pub use version::{SupportedRange, Version};
