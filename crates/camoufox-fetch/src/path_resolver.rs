//! Install directory and executable resolution.
//!
//! [`PathResolver`] is the entry point browser launchers call: it answers
//! "where is the browser?", installing or refusing according to the
//! configured policy. Installs run under the [`InstallLock`] and complete
//! before any path is returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use camoufox_core::paths::{ensure_directory, is_empty_dir};
use camoufox_core::{
    ConfigOverrides, FetchConfig, FetchError, FetchResult, InstalledMetadata, NoopProgress,
    OsName, ProgressReporter, TargetPlatform, Version,
};
use tracing::{debug, info, warn};

use crate::downloader::Downloader;
use crate::http::{HttpBackend, ReqwestBackend};
use crate::installer::ArchiveInstaller;
use crate::lock::InstallLock;
use crate::resolver::{CamoufoxAssetMatcher, ReleaseAsset, ReleaseAssetResolver};

/// Where the executable lives inside a macOS install.
const MAC_RESOURCES: [&str; 3] = ["Camoufox.app", "Contents", "Resources"];

/// Observed state of the install directory.
#[derive(Debug)]
enum InstallState {
    /// Directory absent or empty.
    Missing,
    /// Files present but no metadata record.
    Incomplete,
    /// Recorded release outside the supported range.
    Unsupported(Version),
    Ready(Version),
}

/// Resolves, installs and updates a Camoufox build.
pub struct PathResolver<B: HttpBackend = ReqwestBackend> {
    config: FetchConfig,
    platform: TargetPlatform,
    downloader: Arc<Downloader<B>>,
    releases: ReleaseAssetResolver<B>,
    installer: ArchiveInstaller,
    progress: Arc<dyn ProgressReporter>,
}

/// Resolver backed by the production HTTP client.
pub type DefaultPathResolver = PathResolver<ReqwestBackend>;

impl PathResolver<ReqwestBackend> {
    /// Resolver for the host platform using `config`.
    pub fn new(config: FetchConfig) -> FetchResult<Self> {
        let platform = TargetPlatform::detect()?;
        let backend = ReqwestBackend::new(&config)?;
        Self::with_backend(config, platform, backend)
    }

    /// Resolver configured from `CAMOUFOX_*` environment variables.
    pub fn from_env() -> FetchResult<Self> {
        let config = FetchConfig::from_env(ConfigOverrides::default())?;
        Self::new(config)
    }
}

impl<B: HttpBackend> PathResolver<B> {
    /// Resolver with an explicit platform and HTTP backend.
    pub fn with_backend(config: FetchConfig, platform: TargetPlatform, backend: B) -> FetchResult<Self> {
        let downloader = Arc::new(Downloader::new(backend, &config));
        let matcher = CamoufoxAssetMatcher::new(&config, platform)?;
        let releases = ReleaseAssetResolver::new(Arc::clone(&downloader), config.releases_url(), matcher);

        Ok(Self {
            config,
            platform,
            downloader,
            releases,
            installer: ArchiveInstaller::new(platform),
            progress: Arc::new(NoopProgress),
        })
    }

    /// Report download progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub const fn platform(&self) -> TargetPlatform {
        self.platform
    }

    pub fn install_dir(&self) -> &Path {
        self.config.install_dir()
    }

    /// The data directory, created if missing.
    pub fn data_dir(&self) -> FetchResult<PathBuf> {
        let dir = self.config.data_dir();
        ensure_directory(dir)?;
        Ok(dir.to_path_buf())
    }

    /// Directory the browser is launched from.
    ///
    /// This is the install directory itself, except on macOS where it is the
    /// app bundle's `Resources` folder.
    pub fn launch_dir(&self) -> PathBuf {
        let dir = self.install_dir().to_path_buf();
        match self.platform.os() {
            OsName::Mac => MAC_RESOURCES.iter().fold(dir, |acc, part| acc.join(part)),
            OsName::Win | OsName::Lin => dir,
        }
    }

    pub fn installed_metadata(&self) -> FetchResult<InstalledMetadata> {
        InstalledMetadata::read(self.install_dir())
    }

    /// Release recorded in the install directory's metadata.
    pub fn installed_version(&self) -> FetchResult<Version> {
        Ok(self.installed_metadata()?.to_version())
    }

    /// The newest supported release in the feed. Queried once per resolver.
    ///
    /// Fails with [`FetchError::UpdatesDisabled`] when updates are suppressed.
    pub async fn selected_release(&self) -> FetchResult<&ReleaseAsset> {
        self.ensure_fetch_allowed()?;
        self.releases.resolve().await
    }

    fn ensure_fetch_allowed(&self) -> FetchResult<()> {
        if self.config.skip_updates() {
            warn!("Release fetch requested but updates are disabled");
            return Err(FetchError::UpdatesDisabled);
        }
        Ok(())
    }

    fn inspect(&self) -> FetchResult<InstallState> {
        let dir = self.install_dir();
        if is_empty_dir(dir) {
            return Ok(InstallState::Missing);
        }
        match self.installed_version() {
            Ok(version) if version.is_supported(self.config.supported_range()) => {
                Ok(InstallState::Ready(version))
            }
            Ok(version) => Ok(InstallState::Unsupported(version)),
            Err(FetchError::MetadataNotFound { .. }) => Ok(InstallState::Incomplete),
            Err(FetchError::Json(e)) => {
                warn!(dir = %dir.display(), error = %e, "Unreadable version metadata");
                Ok(InstallState::Incomplete)
            }
            Err(e) => Err(e),
        }
    }

    /// Directory of a usable install.
    ///
    /// A missing, incomplete or unsupported install is replaced when
    /// `download_if_missing` is set. With updates suppressed nothing is ever
    /// downloaded: an unsupported install is returned as-is with a warning.
    pub async fn resolve_install_dir(&self, download_if_missing: bool) -> FetchResult<PathBuf> {
        let dir = self.install_dir().to_path_buf();
        let skip = self.config.skip_updates();

        match self.inspect()? {
            InstallState::Ready(version) => {
                debug!(dir = %dir.display(), %version, "Using installed Camoufox");
                return Ok(dir);
            }
            InstallState::Unsupported(version) if skip => {
                warn!(%version, range = %self.config.supported_range(), "Installed release is unsupported but updates are disabled");
                return Ok(dir);
            }
            InstallState::Unsupported(version) if !download_if_missing => {
                return Err(FetchError::UnsupportedVersion {
                    version: version.display_string(),
                    range: self.config.supported_range().to_string(),
                });
            }
            InstallState::Incomplete if skip || !download_if_missing => {
                return Err(FetchError::MetadataNotFound {
                    path: InstalledMetadata::path(&dir),
                });
            }
            InstallState::Missing if skip || !download_if_missing => {
                return Err(FetchError::NotInstalled { path: dir });
            }
            state => info!(?state, dir = %dir.display(), "Installing Camoufox"),
        }

        let _lock = InstallLock::acquire(&self.data_dir()?).await?;
        // Another process may have finished an install while we waited.
        if let InstallState::Ready(version) = self.inspect()? {
            debug!(%version, "Install completed by another process");
            return Ok(dir);
        }
        self.install_locked().await?;
        Ok(dir)
    }

    /// Path to the browser executable.
    pub async fn executable_path(&self, download_if_missing: bool) -> FetchResult<PathBuf> {
        self.resolve_install_dir(download_if_missing).await?;

        let path = self
            .launch_dir()
            .join(self.config.executable_name(self.platform.os()));
        if !path.exists() {
            return Err(FetchError::NotInstalled { path });
        }
        Ok(path)
    }

    /// Whether the installed release differs from the feed's selection.
    ///
    /// Always `false` when updates are suppressed. A missing or unreadable
    /// metadata record counts as out of date.
    pub async fn is_update_needed(&self) -> FetchResult<bool> {
        if self.config.skip_updates() {
            debug!("Update check skipped");
            return Ok(false);
        }

        let installed = match self.installed_version() {
            Ok(version) => version,
            Err(FetchError::MetadataNotFound { .. } | FetchError::Json(_)) => return Ok(true),
            Err(e) => return Err(e),
        };
        let selected = self.selected_release().await?;
        let needed = installed != selected.version;
        debug!(installed = %installed, available = %selected.version, needed, "Checked for update");
        Ok(needed)
    }

    /// Install the selected release if it differs from what is installed.
    ///
    /// Returns whether an install happened.
    pub async fn update(&self) -> FetchResult<bool> {
        if !self.is_update_needed().await? {
            return Ok(false);
        }
        self.install().await?;
        Ok(true)
    }

    /// Download and install the selected release unconditionally.
    ///
    /// Refused with [`FetchError::UpdatesDisabled`] when updates are suppressed.
    pub async fn install(&self) -> FetchResult<InstalledMetadata> {
        self.ensure_fetch_allowed()?;
        let _lock = InstallLock::acquire(&self.data_dir()?).await?;
        self.install_locked().await
    }

    async fn install_locked(&self) -> FetchResult<InstalledMetadata> {
        let asset = self.selected_release().await?;
        info!(
            version = %asset.version,
            asset = %asset.name,
            target = %self.install_dir().display(),
            "Downloading Camoufox"
        );

        let staging = tempfile::Builder::new()
            .prefix("download-")
            .tempdir_in(self.data_dir()?)?;
        let archive_path = staging.path().join(&asset.name);

        let mut file = tokio::fs::File::create(&archive_path).await?;
        self.downloader
            .fetch_into(&asset.url, &mut file, Some(self.progress.as_ref()))
            .await?;
        drop(file);

        self.progress.message(&format!("Extracting {}", asset.name));
        let metadata = InstalledMetadata::new(&asset.version, Some(asset.name.clone()));
        self.installer
            .install(&archive_path, asset.format, self.install_dir(), &metadata)
            .await?;
        Ok(metadata)
    }

    /// Delete the install directory. Returns whether anything was removed.
    pub async fn remove(&self) -> FetchResult<bool> {
        let _lock = InstallLock::acquire(&self.data_dir()?).await?;
        ArchiveInstaller::cleanup(self.install_dir()).await
    }
}
