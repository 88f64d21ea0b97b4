//! Archive extraction into the install directory.
//!
//! Extraction happens in a staging directory next to the target and is
//! promoted with a single rename, so the install directory is either absent
//! or complete. The metadata record is written last; any failure along the
//! way removes the target again.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use camoufox_core::{FetchError, FetchResult, InstalledMetadata, OsName, TargetPlatform};
use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

/// Container formats published for releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Map an asset extension (`zip`, `tar.gz`, `tgz`) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "zip" => Some(Self::Zip),
            "tar.gz" | "tgz" => Some(Self::TarGz),
            _ => None,
        }
    }
}

/// Unpacks downloaded archives into place.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveInstaller {
    platform: TargetPlatform,
}

impl ArchiveInstaller {
    pub const fn new(platform: TargetPlatform) -> Self {
        Self { platform }
    }

    /// Replace `target_dir` with the contents of `archive`, then record `metadata`.
    ///
    /// On error the target directory is removed before the error is returned.
    pub async fn install(
        &self,
        archive: &Path,
        format: ArchiveFormat,
        target_dir: &Path,
        metadata: &InstalledMetadata,
    ) -> FetchResult<()> {
        match self.try_install(archive, format, target_dir, metadata).await {
            Ok(()) => {
                info!(
                    target = %target_dir.display(),
                    release = %metadata.release,
                    "Install complete"
                );
                Ok(())
            }
            Err(e) => {
                warn!(target = %target_dir.display(), error = %e, "Install failed, rolling back");
                if let Err(cleanup_err) = Self::cleanup(target_dir).await {
                    warn!(error = %cleanup_err, "Rollback cleanup failed");
                }
                Err(e)
            }
        }
    }

    async fn try_install(
        &self,
        archive: &Path,
        format: ArchiveFormat,
        target_dir: &Path,
        metadata: &InstalledMetadata,
    ) -> FetchResult<()> {
        Self::cleanup(target_dir).await?;

        let parent = target_dir
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        tokio::fs::create_dir_all(&parent).await?;

        let archive = archive.to_path_buf();
        let target = target_dir.to_path_buf();
        let make_executable = self.platform.os() != OsName::Win;

        tokio::task::spawn_blocking(move || -> FetchResult<()> {
            let staging = tempfile::Builder::new()
                .prefix(".camoufox-staging-")
                .tempdir_in(&parent)?;
            debug!(staging = %staging.path().display(), ?format, "Extracting archive");

            match format {
                ArchiveFormat::Zip => extract_zip(&archive, staging.path())?,
                ArchiveFormat::TarGz => extract_tar_gz(&archive, staging.path())?,
            }
            if make_executable {
                mark_executable(staging.path())?;
            }

            fs::rename(staging.path(), &target)?;
            Ok(())
        })
        .await
        .map_err(|e| FetchError::Io(io::Error::other(e)))??;

        metadata.write(target_dir)?;
        Ok(())
    }

    /// Remove `target_dir` recursively. Returns whether anything was removed.
    pub async fn cleanup(target_dir: &Path) -> FetchResult<bool> {
        let meta = match tokio::fs::symlink_metadata(target_dir).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        if meta.is_dir() {
            tokio::fs::remove_dir_all(target_dir).await?;
        } else {
            tokio::fs::remove_file(target_dir).await?;
        }
        info!(path = %target_dir.display(), "Removed install directory");
        Ok(true)
    }
}

/// Extract a zip archive, refusing entries that would land outside `dest`.
fn extract_zip(archive: &Path, dest: &Path) -> FetchResult<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(FetchError::archive)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(FetchError::archive)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(FetchError::Archive(format!(
                "entry escapes install directory: {}",
                entry.name()
            )));
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
    }
    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> FetchResult<()> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.unpack(dest).map_err(FetchError::archive)
}

#[cfg(unix)]
fn mark_executable(root: &Path) -> FetchResult<()> {
    use std::os::unix::fs::PermissionsExt;

    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let mut perms = entry.metadata().map_err(io::Error::from)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        fs::set_permissions(entry.path(), perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_root: &Path) -> FetchResult<()> {
    Ok(())
}
