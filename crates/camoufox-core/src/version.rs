//! Release identifiers and the supported version window.
//!
//! A release string such as `beta.24` or `135.0` is decomposed on `.` into a
//! sequence of integer components. Parsing never fails: a component that is
//! not a plain decimal number maps to a negative value derived from its first
//! character, so alphabetic pre-release tags (`alpha`, `beta`) sort below any
//! numeric release. Malformed input therefore degrades to a deterministic,
//! low-sorting value instead of rejecting an install outright.
//!
//! Comparison treats every sequence as right-padded with zeros to at least
//! [`PADDED_LEN`] components, so `1`, `1.0` and `1.0.0.0.0` are equal.

use std::cmp::Ordering;
use std::fmt;

/// Minimum number of components every release is padded to before comparison.
pub const PADDED_LEN: usize = 5;

/// Offset subtracted from a non-numeric component's first character code.
const NON_NUMERIC_OFFSET: i64 = 1024;

/// Oldest release (exclusive) this client is compatible with.
pub const DEFAULT_MIN_RELEASE: &str = "beta.19";

/// Newest release (exclusive) this client is compatible with.
pub const DEFAULT_MAX_RELEASE: &str = "1";

/// A parsed, totally ordered release identifier.
///
/// Equality and ordering only look at the parsed `release` components; the
/// optional `version` string is carried for display and persistence.
#[derive(Debug, Clone)]
pub struct Version {
    release: String,
    version: Option<String>,
    key: Vec<i64>,
}

impl Version {
    /// Parse a release identifier with an optional display version.
    pub fn new(release: impl Into<String>, version: Option<String>) -> Self {
        let release = release.into();
        let mut key: Vec<i64> = release.split('.').map(component_key).collect();
        if key.len() < PADDED_LEN {
            key.resize(PADDED_LEN, 0);
        }
        Self {
            release,
            version,
            key,
        }
    }

    /// Parse a bare release identifier with no display version.
    pub fn parse(release: &str) -> Self {
        Self::new(release, None)
    }

    /// The release identifier as given.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// The display version, if one was recorded.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The padded integer components used for comparison.
    pub fn components(&self) -> &[i64] {
        &self.key
    }

    /// Whether this release lies strictly inside `range`.
    pub fn is_supported(&self, range: &SupportedRange) -> bool {
        range.contains(self)
    }

    /// User-facing `version-release` string. Never used for comparison.
    pub fn display_string(&self) -> String {
        match &self.version {
            Some(version) => format!("{version}-{}", self.release),
            None => self.release.clone(),
        }
    }

    fn component(&self, index: usize) -> i64 {
        self.key.get(index).copied().unwrap_or(0)
    }
}

fn component_key(part: &str) -> i64 {
    if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
        // All-digit components too large for i64 saturate instead of sorting as text
        return part.parse::<i64>().unwrap_or(i64::MAX);
    }
    part.chars()
        .next()
        .map_or(-NON_NUMERIC_OFFSET, |c| i64::from(u32::from(c)) - NON_NUMERIC_OFFSET)
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.key.len().max(other.key.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

/// Exclusive `(min, max)` window of releases this client can drive.
///
/// Both bounds are excluded so a release sitting exactly on either edge is
/// treated as unsupported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedRange {
    min: Version,
    max: Version,
}

impl SupportedRange {
    /// Build a range from two release identifiers.
    pub fn new(min: &str, max: &str) -> Self {
        Self {
            min: Version::parse(min),
            max: Version::parse(max),
        }
    }

    /// Lower bound (exclusive).
    pub const fn min(&self) -> &Version {
        &self.min
    }

    /// Upper bound (exclusive).
    pub const fn max(&self) -> &Version {
        &self.max
    }

    /// `min < version < max`.
    pub fn contains(&self, version: &Version) -> bool {
        &self.min < version && version < &self.max
    }
}

impl Default for SupportedRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RELEASE, DEFAULT_MAX_RELEASE)
    }
}

impl fmt::Display for SupportedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{}, <{}", self.min.release(), self.max.release())
    }
}
