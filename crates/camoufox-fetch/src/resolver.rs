//! Release feed resolution.
//!
//! The feed lists releases newest first. The first asset whose filename
//! matches the target platform and whose release falls inside the supported
//! range wins; the result is memoized per resolver.

use std::sync::Arc;

use camoufox_core::{
    AssetMatcher, FeedAsset, FeedRelease, FetchConfig, FetchError, FetchResult, SupportedRange,
    TargetPlatform, Version, find_first_match,
};
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::downloader::Downloader;
use crate::http::HttpBackend;
use crate::installer::ArchiveFormat;

/// A feed asset selected for install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub version: Version,
    pub url: String,
    pub name: String,
    pub format: ArchiveFormat,
}

/// Matches `<product>-<version>-<release>-<os>.<arch>.<zip|tar.gz>` for one
/// platform, accepting only releases inside the supported range.
#[derive(Debug, Clone)]
pub struct CamoufoxAssetMatcher {
    pattern: Regex,
    platform: TargetPlatform,
    range: SupportedRange,
    repo: String,
}

impl CamoufoxAssetMatcher {
    pub fn new(config: &FetchConfig, platform: TargetPlatform) -> FetchResult<Self> {
        let pattern = format!(
            r"^{product}-(?P<version>.+)-(?P<release>[^-]+)-{os}\.{arch}\.(?P<ext>zip|tar\.gz)$",
            product = regex::escape(config.product()),
            os = regex::escape(platform.os().as_str()),
            arch = regex::escape(platform.arch().as_str()),
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| FetchError::InvalidFeed(format!("invalid asset pattern: {e}")))?;

        Ok(Self {
            pattern,
            platform,
            range: config.supported_range().clone(),
            repo: config.repo().to_string(),
        })
    }

    pub const fn platform(&self) -> TargetPlatform {
        self.platform
    }
}

impl AssetMatcher for CamoufoxAssetMatcher {
    type Match = ReleaseAsset;

    fn check_asset(&self, asset: &FeedAsset) -> Option<ReleaseAsset> {
        let caps = self.pattern.captures(&asset.name)?;
        let version = Version::new(&caps["release"], Some(caps["version"].to_string()));

        if !version.is_supported(&self.range) {
            debug!(asset = %asset.name, range = %self.range, "Skipping unsupported release");
            return None;
        }

        Some(ReleaseAsset {
            version,
            url: asset.browser_download_url.clone(),
            name: asset.name.clone(),
            format: ArchiveFormat::from_extension(&caps["ext"])?,
        })
    }

    fn missing_asset_error(&self) -> FetchError {
        FetchError::MissingRelease {
            os: self.platform.os().to_string(),
            arch: self.platform.arch().to_string(),
            repo: self.repo.clone(),
            range: self.range.to_string(),
        }
    }
}

/// Fetches the release feed once and remembers the selected asset.
pub struct ReleaseAssetResolver<B, M: AssetMatcher = CamoufoxAssetMatcher> {
    downloader: Arc<Downloader<B>>,
    feed_url: String,
    matcher: M,
    selected: OnceCell<M::Match>,
}

impl<B: HttpBackend, M: AssetMatcher> ReleaseAssetResolver<B, M> {
    pub fn new(downloader: Arc<Downloader<B>>, feed_url: impl Into<String>, matcher: M) -> Self {
        Self {
            downloader,
            feed_url: feed_url.into(),
            matcher,
            selected: OnceCell::new(),
        }
    }

    pub const fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    /// Download and parse the release feed. Not memoized.
    pub async fn fetch_releases(&self) -> FetchResult<Vec<FeedRelease>> {
        let body = self.downloader.fetch(&self.feed_url).await?;
        let releases: Vec<FeedRelease> = serde_json::from_slice(&body)
            .map_err(|e| FetchError::InvalidFeed(format!("{}: {e}", self.feed_url)))?;
        info!(url = %self.feed_url, releases = releases.len(), "Fetched release feed");
        Ok(releases)
    }

    /// The first matching asset in feed order, fetched at most once.
    ///
    /// A failed lookup is not cached; the next call queries the feed again.
    pub async fn resolve(&self) -> FetchResult<&M::Match> {
        self.selected
            .get_or_try_init(|| async {
                let releases = self.fetch_releases().await?;
                find_first_match(&releases, &self.matcher)
            })
            .await
    }

    /// The memoized selection, if [`resolve`](Self::resolve) already succeeded.
    pub fn cached(&self) -> Option<&M::Match> {
        self.selected.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{Scripted, ScriptedBackend};
    use camoufox_core::{ArchName, OsName};
    use std::time::Duration;

    const FEED: &str = "https://api.github.com/repos/daijro/camoufox/releases";

    fn config() -> FetchConfig {
        FetchConfig::new("/tmp/camoufox-test/install", "/tmp/camoufox-test/data")
            .with_supported_range(SupportedRange::new("99.0", "120.0"))
    }

    fn linux() -> TargetPlatform {
        TargetPlatform::new(OsName::Lin, ArchName::X86_64).unwrap()
    }

    fn asset(name: &str) -> FeedAsset {
        FeedAsset {
            name: name.to_string(),
            browser_download_url: format!("https://dl.example.com/{name}"),
        }
    }

    fn matcher() -> CamoufoxAssetMatcher {
        CamoufoxAssetMatcher::new(&config(), linux()).unwrap()
    }

    #[test]
    fn test_matches_platform_asset() {
        let found = matcher()
            .check_asset(&asset("camoufox-135.0.1-110.0-lin.x86_64.zip"))
            .unwrap();
        assert_eq!(found.version, Version::parse("110.0"));
        assert_eq!(found.version.version(), Some("135.0.1"));
        assert_eq!(found.format, ArchiveFormat::Zip);
        assert!(found.url.ends_with("lin.x86_64.zip"));
    }

    #[test]
    fn test_rejects_other_platforms_and_extensions() {
        let m = matcher();
        for name in [
            "camoufox-135.0-110.0-lin.arm64.zip",
            "camoufox-135.0-110.0-mac.x86_64.zip",
            "camoufox-135.0-110.0-win.x86_64.zip",
            "camoufox-135.0-110.0-lin.x86_64.zip.sha256",
            "camoufox-135.0-110.0-lin.x86_64.dmg",
            "other-135.0-110.0-lin.x86_64.zip",
            "camoufox-110.0-lin.x86_64.zip",
        ] {
            assert!(m.check_asset(&asset(name)).is_none(), "{name}");
        }
    }

    #[test]
    fn test_accepts_tar_gz() {
        let found = matcher()
            .check_asset(&asset("camoufox-135.0-110.0-lin.x86_64.tar.gz"))
            .unwrap();
        assert_eq!(found.format, ArchiveFormat::TarGz);
    }

    #[test]
    fn test_rejects_out_of_range_and_bounds() {
        let m = matcher();
        for release in ["99.0", "120.0", "121.0", "beta.24"] {
            let name = format!("camoufox-135.0-{release}-lin.x86_64.zip");
            assert!(m.check_asset(&asset(&name)).is_none(), "{release}");
        }
    }

    #[test]
    fn test_missing_error_names_platform_and_range() {
        let err = matcher().missing_asset_error();
        let text = err.to_string();
        assert!(text.contains("lin"), "{text}");
        assert!(text.contains("x86_64"), "{text}");
        assert!(text.contains("daijro/camoufox"), "{text}");
    }

    fn feed_json() -> Vec<u8> {
        serde_json::json!([
            {
                "tag_name": "v121",
                "assets": [
                    {"name": "camoufox-140.0-121.0-lin.x86_64.zip", "browser_download_url": "https://dl/121"}
                ]
            },
            {
                "tag_name": "v110",
                "assets": [
                    {"name": "camoufox-135.0-110.0-mac.arm64.zip", "browser_download_url": "https://dl/mac"},
                    {"name": "camoufox-135.0-110.0-lin.x86_64.zip", "browser_download_url": "https://dl/110"}
                ]
            },
            {
                "tag_name": "v105",
                "assets": [
                    {"name": "camoufox-130.0-105.0-lin.x86_64.zip", "browser_download_url": "https://dl/105"}
                ]
            }
        ])
        .to_string()
        .into_bytes()
    }

    fn resolver(backend: Arc<ScriptedBackend>) -> ReleaseAssetResolver<Arc<ScriptedBackend>> {
        let downloader = Arc::new(Downloader::with_policy(backend, 2, Duration::ZERO));
        ReleaseAssetResolver::new(downloader, FEED, matcher())
    }

    #[tokio::test]
    async fn test_resolve_picks_first_supported_and_memoizes() {
        let backend = Arc::new(ScriptedBackend::new().script(FEED, [Scripted::body(&feed_json())]));
        let resolver = resolver(Arc::clone(&backend));

        assert!(resolver.cached().is_none());
        let first = resolver.resolve().await.unwrap().clone();
        assert_eq!(first.url, "https://dl/110");
        assert_eq!(first.version.release(), "110.0");

        let second = resolver.resolve().await.unwrap();
        assert_eq!(second, &first);
        assert_eq!(backend.attempts(FEED), 1);
        assert!(resolver.cached().is_some());
    }

    #[tokio::test]
    async fn test_resolve_missing_release() {
        let body = serde_json::json!([{"tag_name": "v1", "assets": []}]).to_string();
        let backend = Arc::new(ScriptedBackend::new().script(FEED, [Scripted::body(body.as_bytes())]));
        let resolver = resolver(backend);

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, FetchError::MissingRelease { .. }), "{err}");
        assert!(resolver.cached().is_none());
    }

    #[tokio::test]
    async fn test_malformed_feed_is_invalid_feed() {
        let backend =
            Arc::new(ScriptedBackend::new().script(FEED, [Scripted::body(b"{\"message\":\"nope\"}")]));
        let err = resolver(backend).resolve().await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidFeed(_)), "{err}");
    }

    #[tokio::test]
    async fn test_feed_download_is_retried() {
        let backend = Arc::new(ScriptedBackend::new().script(
            FEED,
            [Scripted::Status(500), Scripted::body(&feed_json())],
        ));
        let resolver = resolver(Arc::clone(&backend));

        assert!(resolver.resolve().await.is_ok());
        assert_eq!(backend.attempts(FEED), 2);
    }
}
