//! Release feed types and the generic feed walk.
//!
//! The feed is a list of releases, newest first, each carrying a list of
//! downloadable assets. Product-specific selection is expressed through the
//! [`AssetMatcher`] capability; [`find_first_match`] is the single scan that
//! every matcher shares.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// One downloadable file within a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// One published release. Only the assets are consulted for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRelease {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<FeedAsset>,
}

/// Asset selection policy plugged into [`find_first_match`].
pub trait AssetMatcher: Send + Sync {
    /// What an accepted asset resolves to.
    type Match: Send;

    /// Accept or reject a single asset.
    fn check_asset(&self, asset: &FeedAsset) -> Option<Self::Match>;

    /// Error reported when the whole feed yields no accepted asset.
    fn missing_asset_error(&self) -> FetchError;
}

/// Walk releases in feed order, and assets in release order, returning the
/// first asset the matcher accepts.
///
/// The walk stops at the first accepted asset, so the feed must be ordered
/// newest first.
pub fn find_first_match<M: AssetMatcher>(
    releases: &[FeedRelease],
    matcher: &M,
) -> FetchResult<M::Match> {
    for release in releases {
        for asset in &release.assets {
            if let Some(found) = matcher.check_asset(asset) {
                debug!(release = %release.tag_name, asset = %asset.name, "Accepted release asset");
                return Ok(found);
            }
        }
    }
    Err(matcher.missing_asset_error())
}
