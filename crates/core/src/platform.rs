//! Host platform identification.
//!
//! conda registries select artifacts by `subdir` (`linux-64`, `osx-arm64`,
//! `win-64`, ...). [`Platform`] maps the compile target onto that string and
//! back.

use crate::{Error, Result};

/// Platform identifier combining OS and architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Get the current platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] when the host has no conda subdir.
    pub fn current() -> Result<Self> {
        let unsupported = || Error::UnsupportedPlatform {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        };
        let os = Os::parse(std::env::consts::OS).ok_or_else(unsupported)?;
        let arch = Arch::host().ok_or_else(unsupported)?;
        Ok(Self { os, arch })
    }

    /// The conda subdir for this platform, e.g. `linux-64` or `osx-arm64`.
    #[must_use]
    pub fn subdir(&self) -> String {
        let arch = match (self.os, self.arch) {
            (_, Arch::X86_64) => "64",
            (Os::Linux, Arch::Aarch64) => "aarch64",
            (_, Arch::Aarch64) => "arm64",
            (_, Arch::Ppc64le) => "ppc64le",
        };
        format!("{}-{}", self.os.subdir_prefix(), arch)
    }

    /// Parse a conda subdir string like `osx-arm64`.
    #[must_use]
    pub fn from_subdir(subdir: &str) -> Option<Self> {
        let (os, arch) = subdir.split_once('-')?;
        let os = match os {
            "linux" => Os::Linux,
            "osx" => Os::Darwin,
            "win" => Os::Windows,
            _ => return None,
        };
        let arch = match (os, arch) {
            (_, "64") => Arch::X86_64,
            (Os::Linux, "aarch64") | (Os::Darwin | Os::Windows, "arm64") => Arch::Aarch64,
            (Os::Linux, "ppc64le") => Arch::Ppc64le,
            _ => return None,
        };
        Some(Self { os, arch })
    }

    /// Suffix appended to executable file names on this platform.
    #[must_use]
    pub fn exe_suffix(&self) -> &'static str {
        if self.os == Os::Windows { ".exe" } else { "" }
    }

    /// Whether this is a Windows platform.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.subdir())
    }
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux.
    Linux,
    /// macOS.
    Darwin,
    /// Windows.
    Windows,
}

impl Os {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "darwin" | "macos" | "osx" => Some(Self::Darwin),
            "windows" | "win" => Some(Self::Windows),
            _ => None,
        }
    }

    fn subdir_prefix(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "osx",
            Self::Windows => "win",
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// x86-64 / amd64.
    X86_64,
    /// aarch64 / arm64.
    Aarch64,
    /// Little-endian POWER.
    Ppc64le,
}

impl Arch {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "aarch64" | "arm64" => Some(Self::Aarch64),
            "ppc64le" => Some(Self::Ppc64le),
            _ => None,
        }
    }

    /// Architecture of the compile target.
    ///
    /// Rust reports both POWER byte orders as `powerpc64`; conda only ships
    /// the little-endian one.
    fn host() -> Option<Self> {
        Self::from_target(std::env::consts::ARCH, cfg!(target_endian = "little"))
    }

    fn from_target(arch: &str, little_endian: bool) -> Option<Self> {
        match arch {
            "powerpc64" if little_endian => Some(Self::Ppc64le),
            "powerpc64" => None,
            other => Self::parse(other),
        }
    }
}
