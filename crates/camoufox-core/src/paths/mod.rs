//! Path utilities for Camoufox install and data directories.
//!
//! This module provides the default locations used when the caller passes no
//! override:
//! - Install directory (unpacked browser and its metadata file)
//! - Data directory (install lock, download staging)
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O
//! - OS-specific lookups are kept private in `defaults`

mod defaults;
mod ensure;
mod error;

// Error type
pub use error::PathError;

// Platform defaults
pub use defaults::{
    APP_DIR_NAME, default_data_dir, default_install_dir, normalize_user_path,
};

// Directory operations
pub use ensure::{ensure_directory, is_empty_dir};
