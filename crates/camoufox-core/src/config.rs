//! Immutable configuration for the package manager.
//!
//! A [`FetchConfig`] is built once at process start and threaded by
//! reference into every component. Callers customize it either through the
//! three-field [`ConfigOverrides`] object or through the `with_*` builder
//! methods.
//!
//! # Example
//!
//! ```
//! use camoufox_core::FetchConfig;
//! use std::time::Duration;
//!
//! let config = FetchConfig::new("/opt/camoufox", "/var/lib/camoufox")
//!     .with_retries(3)
//!     .with_retry_delay(Duration::from_secs(1));
//! assert_eq!(config.retries(), 3);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::paths::{PathError, default_data_dir, default_install_dir, normalize_user_path};
use crate::platform::OsName;
use crate::version::SupportedRange;

/// Overrides the install directory.
pub const ENV_INSTALL_DIR: &str = "CAMOUFOX_INSTALL_DIR";
/// Overrides the data directory.
pub const ENV_DATA_DIR: &str = "CAMOUFOX_DATA_DIR";
/// When truthy, suppresses every update check and download.
pub const ENV_SKIP_UPDATE: &str = "CAMOUFOX_SKIP_UPDATE";
/// Bearer token sent with release feed requests.
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

const DEFAULT_REPO: &str = "daijro/camoufox";
const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_PRODUCT: &str = "camoufox";
const DEFAULT_RETRIES: u32 = 5;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Caller-supplied overrides. Every field is optional and flows unchanged
/// into the resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    /// Where the browser is unpacked.
    pub install_dir: Option<PathBuf>,
    /// Where locks and download staging live.
    pub data_dir: Option<PathBuf>,
    /// Per-OS executable path relative to the launch directory.
    pub executable_names: Option<HashMap<OsName, String>>,
}

/// Resolved package manager configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    install_dir: PathBuf,
    data_dir: PathBuf,
    executable_names: HashMap<OsName, String>,
    supported_range: SupportedRange,
    repo: String,
    api_base_url: String,
    product: String,
    retries: u32,
    retry_delay: Duration,
    connect_timeout: Duration,
    user_agent: String,
    github_token: Option<String>,
    skip_updates: bool,
}

impl FetchConfig {
    /// Configuration with explicit directories and default everything else.
    ///
    /// Does not read the environment.
    pub fn new(install_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            data_dir: data_dir.into(),
            executable_names: default_executable_names(),
            supported_range: SupportedRange::default(),
            repo: DEFAULT_REPO.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: concat!("camoufox-fetch/", env!("CARGO_PKG_VERSION")).to_string(),
            github_token: None,
            skip_updates: false,
        }
    }

    /// Resolve configuration from overrides and the process environment.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, PathError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from overrides and an injectable variable lookup.
    ///
    /// Directory resolution order:
    /// 1. Explicit override
    /// 2. `CAMOUFOX_INSTALL_DIR` / `CAMOUFOX_DATA_DIR`
    /// 3. Platform default
    pub fn from_lookup<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self, PathError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |key: &str| -> Result<Option<PathBuf>, PathError> {
            match lookup(key) {
                Some(raw) if !raw.trim().is_empty() => normalize_user_path(&raw).map(Some),
                _ => Ok(None),
            }
        };

        let install_dir = match overrides.install_dir {
            Some(dir) => dir,
            None => match from_env(ENV_INSTALL_DIR)? {
                Some(dir) => dir,
                None => default_install_dir()?,
            },
        };
        let data_dir = match overrides.data_dir {
            Some(dir) => dir,
            None => match from_env(ENV_DATA_DIR)? {
                Some(dir) => dir,
                None => default_data_dir()?,
            },
        };

        let skip_updates = lookup(ENV_SKIP_UPDATE).is_some_and(|v| is_truthy(&v));
        let github_token = lookup(ENV_GITHUB_TOKEN).filter(|t| !t.trim().is_empty());

        let mut config = Self::new(install_dir, data_dir)
            .with_skip_updates(skip_updates)
            .with_github_token(github_token);
        if let Some(names) = overrides.executable_names {
            config.executable_names.extend(names);
        }

        debug!(
            install_dir = %config.install_dir.display(),
            data_dir = %config.data_dir.display(),
            skip_updates = config.skip_updates,
            "Resolved fetch configuration"
        );
        Ok(config)
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Executable path for `os`, relative to the launch directory.
    pub fn executable_name(&self, os: OsName) -> &str {
        self.executable_names
            .get(&os)
            .map_or_else(|| os.default_executable(), String::as_str)
    }

    pub const fn supported_range(&self) -> &SupportedRange {
        &self.supported_range
    }

    /// `owner/name` of the repository publishing releases.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Filename prefix of release assets.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Total download attempts, including the first.
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    /// Whether update checks and downloads are suppressed.
    pub const fn skip_updates(&self) -> bool {
        self.skip_updates
    }

    /// Releases-list endpoint for the configured repository.
    pub fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/releases",
            self.api_base_url.trim_end_matches('/'),
            self.repo
        )
    }

    #[must_use]
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Override the executable path for one OS.
    #[must_use]
    pub fn with_executable_name(mut self, os: OsName, name: impl Into<String>) -> Self {
        self.executable_names.insert(os, name.into());
        self
    }

    #[must_use]
    pub fn with_supported_range(mut self, range: SupportedRange) -> Self {
        self.supported_range = range;
        self
    }

    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    /// Set the API base URL (defaults to `https://api.github.com`).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    /// Set the total number of download attempts. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Set the fixed delay between download attempts.
    ///
    /// Defaults to 5 seconds.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token;
        self
    }

    #[must_use]
    pub const fn with_skip_updates(mut self, skip: bool) -> Self {
        self.skip_updates = skip;
        self
    }
}

fn default_executable_names() -> HashMap<OsName, String> {
    OsName::ALL
        .iter()
        .map(|os| (*os, os.default_executable().to_string()))
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
