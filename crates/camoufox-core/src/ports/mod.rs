//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from adapters.
//! They contain no HTTP or filesystem implementation details.

pub mod progress;
pub mod release_feed;

pub use progress::{NoopProgress, ProgressReporter};
pub use release_feed::{AssetMatcher, FeedAsset, FeedRelease, find_first_match};
