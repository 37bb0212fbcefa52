//! Installers for micromamba and conda-standalone.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::archive::{self, ArchiveFormat};
use crate::config::EnsureConfig;
use crate::http::HttpFetch;
use crate::placement::ExecutableWriter;
use crate::registry;
use crate::retry::fetch_with_retry;
use crate::tool::ToolKind;
use crate::{Error, Result};

/// Path of micromamba inside its package on unix hosts.
pub const MICROMAMBA_MEMBER: &str = "bin/micromamba";
/// Path of micromamba inside its package on Windows hosts.
pub const MICROMAMBA_WINDOWS_MEMBER: &str = "Library/bin/micromamba.exe";
/// Path of the conda executable inside the conda-standalone package.
pub const CONDA_STANDALONE_MEMBER: &str = "standalone_conda/conda.exe";

/// Downloads and places installable tools into the configured install dir.
pub struct Installer<'a> {
    config: &'a EnsureConfig,
    http: &'a dyn HttpFetch,
}

impl<'a> Installer<'a> {
    /// Create an installer.
    #[must_use]
    pub fn new(config: &'a EnsureConfig, http: &'a dyn HttpFetch) -> Self {
        Self { config, http }
    }

    /// Install `kind` into its install path.
    ///
    /// Returns `Ok(None)` for kinds ensureconda cannot install.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedPlatform`] without a configured platform, or any
    /// failure while fetching, extracting or placing the executable.
    pub fn install(&self, kind: ToolKind) -> Result<Option<PathBuf>> {
        if matches!(kind, ToolKind::Mamba | ToolKind::Conda) {
            return Ok(None);
        }
        self.config.target_platform()?;
        let Some(dest) = self.config.install_path(kind) else {
            return Ok(None);
        };
        let placed = match kind {
            ToolKind::Micromamba => self.install_micromamba(&dest)?,
            ToolKind::CondaStandalone => self.install_conda_standalone(&dest)?,
            ToolKind::Mamba | ToolKind::Conda => return Ok(None),
        };
        Ok(Some(placed))
    }

    /// URL serving the latest micromamba build for the configured platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] when no platform is configured.
    pub fn micromamba_url(&self) -> Result<String> {
        Ok(format!(
            "{}/api/micromamba/{}/latest",
            self.config.micromamba_base_url.trim_end_matches('/'),
            self.config.target_platform()?.subdir()
        ))
    }

    /// Download the latest micromamba and place it at `dest`.
    ///
    /// # Errors
    ///
    /// Any failure while fetching, extracting or placing the executable.
    pub fn install_micromamba(&self, dest: &Path) -> Result<PathBuf> {
        let url = self.micromamba_url()?;
        info!(%url, dest = %dest.display(), "Installing micromamba");

        let member = if self.config.target_platform()?.is_windows() {
            MICROMAMBA_WINDOWS_MEMBER
        } else {
            MICROMAMBA_MEMBER
        };
        self.download_member(&url, member, dest)
    }

    /// Download the newest conda-standalone for the host subdir and place it
    /// at `dest`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidChannel`] before any request for a bad channel name.
    /// - [`Error::NoMatchingPackage`] when the channel has no build for the
    ///   host subdir.
    /// - Any failure while fetching, extracting or placing the executable.
    pub fn install_conda_standalone(&self, dest: &Path) -> Result<PathBuf> {
        let channel = self.config.validated_channel()?;
        let subdir = self.config.target_platform()?.subdir();

        let listing_url = registry::listing_url(&self.config.anaconda_api_url, channel);
        let listing = fetch_with_retry(self.http, &listing_url, &self.config.retry)?;
        let records = registry::parse_listing(&listing_url, &listing.body)?;

        let record =
            registry::select_latest(&records, &subdir).ok_or_else(|| Error::NoMatchingPackage {
                channel: channel.to_string(),
                subdir: subdir.clone(),
            })?;
        info!(
            %channel,
            %subdir,
            version = %record.version,
            build_number = record.attrs.build_number,
            "Installing conda-standalone"
        );

        self.download_member(&record.download_url(), CONDA_STANDALONE_MEMBER, dest)
    }

    fn download_member(&self, url: &str, member: &str, dest: &Path) -> Result<PathBuf> {
        let payload = fetch_with_retry(self.http, url, &self.config.retry)?;
        let format = ArchiveFormat::detect(&payload.body).ok_or_else(|| {
            Error::UnrecognizedArchive {
                url: url.to_string(),
            }
        })?;

        let mut writer = ExecutableWriter::create(dest)?;
        archive::extract_member(format, &payload.body, member, &mut writer)?;
        let placed = writer.commit()?;
        info!(path = %placed.display(), "Installed executable");
        Ok(placed)
    }
}
