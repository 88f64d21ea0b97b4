//! Cross-process install lock.
//!
//! Installs delete and recreate the install directory, so two processes
//! installing at once would trample each other. The lock is an advisory
//! exclusive lock on `<data_dir>/install.lock`, released on drop.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use camoufox_core::FetchResult;
use camoufox_core::paths::ensure_directory;
use fs2::FileExt;
use tracing::{debug, warn};

/// Name of the lock file inside the data directory.
pub const LOCK_FILE: &str = "install.lock";

/// Held exclusive install lock.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Block until the lock in `data_dir` is acquired.
    pub async fn acquire(data_dir: &Path) -> FetchResult<Self> {
        let file = open_lock_file(data_dir)?;
        let path = data_dir.join(LOCK_FILE);

        let file = tokio::task::spawn_blocking(move || -> io::Result<File> {
            FileExt::lock_exclusive(&file)?;
            Ok(file)
        })
        .await
        .map_err(io::Error::other)??;

        debug!(path = %path.display(), "Acquired install lock");
        Ok(Self { file, path })
    }

    /// Acquire the lock if nobody holds it, without waiting.
    pub fn try_acquire(data_dir: &Path) -> FetchResult<Option<Self>> {
        let file = open_lock_file(data_dir)?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self {
                file,
                path: data_dir.join(LOCK_FILE),
            })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release install lock");
        }
    }
}

fn open_lock_file(data_dir: &Path) -> FetchResult<File> {
    ensure_directory(data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(data_dir.join(LOCK_FILE))?;
    Ok(file)
}
