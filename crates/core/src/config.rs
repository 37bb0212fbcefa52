//! Runtime configuration.
//!
//! Everything ensureconda reads from the process environment is gathered into
//! [`EnsureConfig`] up front, so resolution and installation never consult
//! globals and tests can build a config by hand.

use regex::Regex;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::platform::Platform;
use crate::retry::{Backoff, RetryConfig};
use crate::tool::ToolKind;
use crate::{Error, Result};

/// Default anaconda.org channel hosting `conda-standalone`.
pub const DEFAULT_CHANNEL: &str = "anaconda";
/// Host serving the latest micromamba builds.
pub const MICROMAMBA_BASE_URL: &str = "https://micro.mamba.pm";
/// anaconda.org API root.
pub const ANACONDA_API_URL: &str = "https://api.anaconda.org";

/// Overrides the directory executables are installed into.
pub const INSTALL_DIR_VAR: &str = "ENSURECONDA_INSTALL_DIR";
/// Overrides the channel `conda-standalone` is installed from.
pub const CHANNEL_VAR: &str = "ENSURECONDA_CONDA_STANDALONE_CHANNEL";
/// Selects the retry backoff (`floor` or `ceiling`).
pub const BACKOFF_VAR: &str = "ENSURECONDA_RETRY_BACKOFF";

#[allow(clippy::expect_used)]
static CHANNEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("channel pattern is valid"));

/// Configuration for resolving and installing executables.
#[derive(Debug, Clone)]
pub struct EnsureConfig {
    /// Directory the installer writes executables into.
    pub install_dir: PathBuf,
    /// anaconda.org channel for `conda-standalone`.
    pub channel: String,
    /// PATH-style search list; `None` disables PATH discovery.
    pub search_path: Option<OsString>,
    /// Explicit executable paths per tool kind.
    pub overrides: HashMap<ToolKind, PathBuf>,
    /// Platform whose artifacts are installed; `None` on hosts without a
    /// conda subdir, where only discovery works.
    pub platform: Option<Platform>,
    /// Base URL of the micromamba download API.
    pub micromamba_base_url: String,
    /// Base URL of the anaconda.org API.
    pub anaconda_api_url: String,
    /// Retry policy for every remote fetch.
    pub retry: RetryConfig,
}

impl EnsureConfig {
    /// Create a config with defaults, no PATH search and no overrides.
    #[must_use]
    pub fn new(install_dir: PathBuf, platform: Platform) -> Self {
        Self {
            install_dir,
            channel: DEFAULT_CHANNEL.to_string(),
            search_path: None,
            overrides: HashMap::new(),
            platform: Some(platform),
            micromamba_base_url: MICROMAMBA_BASE_URL.to_string(),
            anaconda_api_url: ANACONDA_API_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Build the config from the process environment.
    ///
    /// An unsupported host leaves `platform` unset; discovery still works and
    /// installing fails with [`Error::UnsupportedPlatform`].
    #[must_use]
    pub fn from_env() -> Self {
        let install_dir = env_path(INSTALL_DIR_VAR).unwrap_or_else(default_install_dir);

        let mut config = Self {
            install_dir,
            channel: DEFAULT_CHANNEL.to_string(),
            search_path: std::env::var_os("PATH"),
            overrides: HashMap::new(),
            platform: None,
            micromamba_base_url: MICROMAMBA_BASE_URL.to_string(),
            anaconda_api_url: ANACONDA_API_URL.to_string(),
            retry: RetryConfig::default(),
        };

        match Platform::current() {
            Ok(platform) => config.platform = Some(platform),
            Err(e) => debug!(error = %e, "Installation unavailable on this host"),
        }

        if let Some(channel) = env_value(CHANNEL_VAR) {
            config.channel = channel;
        }

        for kind in ToolKind::ALL {
            if let Some(path) = env_path(kind.override_var()) {
                config.overrides.insert(kind, path);
            }
        }

        if let Some(backoff) = env_value(BACKOFF_VAR) {
            match Backoff::parse(&backoff) {
                Some(backoff) => config.retry.backoff = backoff,
                None => warn!(%backoff, var = BACKOFF_VAR, "Ignoring unknown backoff"),
            }
        }

        config
    }

    /// Set the PATH-style search list.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Pin an explicit executable for a tool kind.
    #[must_use]
    pub fn with_override(mut self, kind: ToolKind, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(kind, path.into());
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The configured channel, validated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] unless the name consists of ASCII
    /// letters, digits, `-` and `_`.
    pub fn validated_channel(&self) -> Result<&str> {
        if CHANNEL_NAME.is_match(&self.channel) {
            Ok(&self.channel)
        } else {
            Err(Error::InvalidChannel {
                channel: self.channel.clone(),
            })
        }
    }

    /// The platform to install for.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] when the host has no conda subdir.
    pub fn target_platform(&self) -> Result<Platform> {
        self.platform.ok_or_else(|| Error::UnsupportedPlatform {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        })
    }

    /// Where the installer places executables of `kind`.
    ///
    /// `None` for kinds ensureconda never installs and on unsupported hosts.
    #[must_use]
    pub fn install_path(&self, kind: ToolKind) -> Option<PathBuf> {
        let platform = self.platform.as_ref()?;
        kind.installed_file_name(platform)
            .map(|name| self.install_dir.join(name))
    }
}

/// Default install directory: the per-user data dir, e.g.
/// `~/.local/share/ensureconda` on Linux.
#[must_use]
pub fn default_install_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local").join("share"))
        .join("ensureconda")
}

fn env_value(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(value),
        Ok(_) | Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(raw)) => {
            warn!(%var, value = ?raw, "Ignoring non UTF-8 value");
            None
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    fn linux() -> Platform {
        Platform::new(Os::Linux, Arch::X86_64)
    }

    #[test]
    fn test_new_defaults() {
        let config = EnsureConfig::new(PathBuf::from("/opt/ensureconda"), linux());
        assert_eq!(config.channel, "anaconda");
        assert!(config.search_path.is_none());
        assert!(config.overrides.is_empty());
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.micromamba_base_url, "https://micro.mamba.pm");
    }

    #[test]
    fn test_install_path() {
        let config = EnsureConfig::new(PathBuf::from("/opt/ensureconda"), linux());
        assert_eq!(
            config.install_path(ToolKind::Micromamba),
            Some(PathBuf::from("/opt/ensureconda/micromamba"))
        );
        assert_eq!(
            config.install_path(ToolKind::CondaStandalone),
            Some(PathBuf::from("/opt/ensureconda/conda_standalone"))
        );
        assert_eq!(config.install_path(ToolKind::Conda), None);
    }

    #[test]
    fn test_no_platform() {
        let mut config = EnsureConfig::new(PathBuf::from("/opt/ensureconda"), linux());
        config.platform = None;
        assert!(matches!(
            config.target_platform(),
            Err(Error::UnsupportedPlatform { .. })
        ));
        for kind in ToolKind::ALL {
            assert_eq!(config.install_path(kind), None);
        }
    }

    #[test]
    fn test_channel_validation() {
        let mut config = EnsureConfig::new(PathBuf::from("/tmp"), linux());
        for ok in ["anaconda", "conda-forge", "my_channel2"] {
            config.channel = ok.to_string();
            assert_eq!(config.validated_channel().unwrap(), ok);
        }
        for bad in ["", "conda forge", "../etc", "chan/nel", "ch@n"] {
            config.channel = bad.to_string();
            assert!(matches!(
                config.validated_channel(),
                Err(Error::InvalidChannel { .. })
            ));
        }
    }

    #[test]
    fn test_from_env_reads_overrides() {
        temp_env::with_vars(
            [
                (INSTALL_DIR_VAR, Some("/custom/install")),
                (CHANNEL_VAR, Some("conda-forge")),
                ("CONDA_EXE", Some("/opt/conda/bin/conda")),
                ("MAMBA_EXE", Some("")),
                (BACKOFF_VAR, Some("ceiling")),
            ],
            || {
                let config = EnsureConfig::from_env();
                assert_eq!(config.install_dir, PathBuf::from("/custom/install"));
                assert_eq!(config.channel, "conda-forge");
                assert_eq!(
                    config.overrides.get(&ToolKind::Conda),
                    Some(&PathBuf::from("/opt/conda/bin/conda"))
                );
                // empty values count as unset
                assert!(!config.overrides.contains_key(&ToolKind::Mamba));
                assert!(matches!(config.retry.backoff, Backoff::Ceiling(_)));
            },
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_from_env_accepts_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let install = OsStr::from_bytes(b"/opt/ensure\xffconda");
        let conda = OsStr::from_bytes(b"/opt/\xfe/bin/conda");
        temp_env::with_vars(
            [
                (OsStr::new(INSTALL_DIR_VAR), Some(install)),
                (OsStr::new("CONDA_EXE"), Some(conda)),
            ],
            || {
                let config = EnsureConfig::from_env();
                assert_eq!(config.install_dir, PathBuf::from(install));
                assert_eq!(
                    config.overrides.get(&ToolKind::Conda),
                    Some(&PathBuf::from(conda))
                );
            },
        );
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars_unset(
            [INSTALL_DIR_VAR, CHANNEL_VAR, BACKOFF_VAR, "CONDA_EXE"],
            || {
                let config = EnsureConfig::from_env();
                assert!(config.install_dir.ends_with("ensureconda"));
                assert_eq!(config.channel, DEFAULT_CHANNEL);
                assert!(matches!(config.retry.backoff, Backoff::Floor(_)));
                assert!(!config.overrides.contains_key(&ToolKind::Conda));
            },
        );
    }
}
