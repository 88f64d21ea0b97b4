//! Target platform detection for release asset selection.
//!
//! Release assets encode the operating system and architecture as fixed
//! filename suffixes (`lin.x86_64`, `mac.arm64`, `win.i686`, ...). This module
//! owns the static tables that map host identifiers onto those names and the
//! matrix of architectures published for each OS. Unsupported combinations
//! fail here, before any network call is made.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, FetchResult};

/// Operating system names as they appear in release asset filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsName {
    Win,
    Mac,
    Lin,
}

impl OsName {
    /// Every OS with published releases.
    pub const ALL: [Self; 3] = [Self::Win, Self::Mac, Self::Lin];

    /// Map a host OS identifier (Rust or foreign spelling) to its asset name.
    pub fn from_identifier(os: &str) -> FetchResult<Self> {
        match os.to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win" | "cygwin" => Ok(Self::Win),
            "macos" | "darwin" | "mac" => Ok(Self::Mac),
            "linux" | "lin" => Ok(Self::Lin),
            _ => Err(FetchError::UnsupportedOs { os: os.to_string() }),
        }
    }

    /// Name used in asset filenames.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Mac => "mac",
            Self::Lin => "lin",
        }
    }

    /// Architectures published for this OS.
    pub const fn supported_archs(self) -> &'static [ArchName] {
        match self {
            Self::Win => &[ArchName::X86_64, ArchName::I686],
            Self::Mac => &[ArchName::X86_64, ArchName::Arm64],
            Self::Lin => &[ArchName::X86_64, ArchName::Arm64, ArchName::I686],
        }
    }

    /// Executable path relative to the launch directory.
    ///
    /// On macOS the launch directory is the bundle's `Resources` folder, so
    /// the binary sits one level up in `MacOS`.
    pub const fn default_executable(self) -> &'static str {
        match self {
            Self::Win => "camoufox.exe",
            Self::Mac => "../MacOS/camoufox",
            Self::Lin => "camoufox-bin",
        }
    }
}

impl fmt::Display for OsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture names as they appear in release asset filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchName {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "i686")]
    I686,
}

impl ArchName {
    /// Map a host architecture identifier to its canonical asset name.
    ///
    /// 32-bit x86 spellings collapse to `i686`; every ARM variant collapses
    /// to `arm64`.
    pub fn from_identifier(arch: &str) -> Option<Self> {
        match arch.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "x86" | "i386" | "i586" | "i686" => Some(Self::I686),
            "aarch64" | "arm64" | "arm" | "armv5l" | "armv6l" | "armv7l" => Some(Self::Arm64),
            _ => None,
        }
    }

    /// Name used in asset filenames.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::I686 => "i686",
        }
    }
}

impl fmt::Display for ArchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated OS/architecture pair.
///
/// Constructing one proves the pair is published, so downstream code never
/// re-checks the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetPlatform {
    os: OsName,
    arch: ArchName,
}

impl TargetPlatform {
    /// Detect the platform this process runs on.
    pub fn detect() -> FetchResult<Self> {
        Self::from_identifiers(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Validate a host OS/architecture pair.
    pub fn from_identifiers(os: &str, arch: &str) -> FetchResult<Self> {
        let os_name = OsName::from_identifier(os)?;
        let unsupported = || FetchError::UnsupportedArchitecture {
            arch: arch.to_string(),
            os: os_name.to_string(),
        };
        let arch_name = ArchName::from_identifier(arch).ok_or_else(unsupported)?;
        Self::new(os_name, arch_name).ok_or_else(unsupported)
    }

    /// Pair already-mapped names, rejecting combinations that are not published.
    pub fn new(os: OsName, arch: ArchName) -> Option<Self> {
        os.supported_archs()
            .contains(&arch)
            .then_some(Self { os, arch })
    }

    pub const fn os(self) -> OsName {
        self.os
    }

    pub const fn arch(self) -> ArchName {
        self.arch
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.os, self.arch)
    }
}
