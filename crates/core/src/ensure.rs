//! The top-level search.
//!
//! Kinds are tried in priority order: mamba, micromamba, conda,
//! conda-standalone. The first candidate satisfying its family's minimum
//! version wins. When installation is permitted, micromamba and
//! conda-standalone are installed and re-checked if no existing candidate
//! qualifies.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::EnsureConfig;
use crate::constraint::satisfies;
use crate::http::HttpFetch;
use crate::install::Installer;
use crate::probe::{CommandProbe, VersionProbe};
use crate::resolve::Resolver;
use crate::tool::{Family, ToolKind};
use crate::version::Version;

/// Which kinds to consider and which minimum versions apply.
#[derive(Debug, Clone)]
pub struct EnsureOptions {
    /// Consider `mamba`.
    pub mamba: bool,
    /// Consider `micromamba`.
    pub micromamba: bool,
    /// Consider `conda`.
    pub conda: bool,
    /// Consider `conda-standalone`.
    pub conda_standalone: bool,
    /// Minimum version for conda and conda-standalone.
    pub min_conda_version: Option<Version>,
    /// Minimum version for mamba and micromamba.
    pub min_mamba_version: Option<Version>,
}

impl Default for EnsureOptions {
    fn default() -> Self {
        Self {
            mamba: true,
            micromamba: true,
            conda: true,
            conda_standalone: true,
            min_conda_version: None,
            min_mamba_version: None,
        }
    }
}

impl EnsureOptions {
    /// Whether `kind` is part of the search.
    #[must_use]
    pub fn is_enabled(&self, kind: ToolKind) -> bool {
        match kind {
            ToolKind::Mamba => self.mamba,
            ToolKind::Micromamba => self.micromamba,
            ToolKind::Conda => self.conda,
            ToolKind::CondaStandalone => self.conda_standalone,
        }
    }

    /// Minimum version applying to `kind`.
    #[must_use]
    pub fn min_version(&self, kind: ToolKind) -> Option<&Version> {
        match kind.family() {
            Family::Conda => self.min_conda_version.as_ref(),
            Family::Mamba => self.min_mamba_version.as_ref(),
        }
    }
}

/// Finds, and optionally installs, a suitable executable.
pub struct Ensurer<'a> {
    config: &'a EnsureConfig,
    http: &'a dyn HttpFetch,
    probe: Option<&'a dyn Fn(ToolKind) -> Box<dyn VersionProbe>>,
}

impl<'a> Ensurer<'a> {
    /// Create an ensurer that probes candidates by running them.
    #[must_use]
    pub fn new(config: &'a EnsureConfig, http: &'a dyn HttpFetch) -> Self {
        Self {
            config,
            http,
            probe: None,
        }
    }

    /// Replace the probe used for each kind.
    #[must_use]
    pub fn with_probe(mut self, probe: &'a dyn Fn(ToolKind) -> Box<dyn VersionProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Run the search.
    ///
    /// Returns `Ok(None)` when no enabled kind produced a qualifying
    /// executable.
    ///
    /// # Errors
    ///
    /// Installation failures abort the search. Candidates that cannot be
    /// probed are skipped, not reported.
    pub fn ensure(
        &self,
        options: &EnsureOptions,
        install_permitted: bool,
    ) -> Result<Option<PathBuf>> {
        let resolver = Resolver::new(self.config);

        for kind in ToolKind::ALL {
            if !options.is_enabled(kind) {
                debug!(%kind, "Skipping disabled kind");
                continue;
            }

            let probe = self.probe_for(kind);
            let min_version = options.min_version(kind);

            for candidate in resolver.candidates(kind) {
                if accept(&candidate, min_version, &*probe) {
                    info!(%kind, exe = %candidate.display(), "Found compatible executable");
                    return Ok(Some(candidate));
                }
            }

            if install_permitted && kind.is_installable() {
                let Some(installed) = Installer::new(self.config, self.http).install(kind)? else {
                    continue;
                };
                if accept(&installed, min_version, &*probe) {
                    info!(%kind, exe = %installed.display(), "Installed compatible executable");
                    return Ok(Some(installed));
                }
                warn!(
                    %kind,
                    exe = %installed.display(),
                    "Installed executable does not satisfy the version constraint"
                );
            }
        }

        Ok(None)
    }

    fn probe_for(&self, kind: ToolKind) -> Box<dyn VersionProbe> {
        match self.probe {
            Some(make) => make(kind),
            None => Box::new(CommandProbe::new(kind.probe_style())),
        }
    }
}

fn accept(candidate: &Path, min_version: Option<&Version>, probe: &dyn VersionProbe) -> bool {
    match satisfies(candidate, min_version, probe) {
        Ok(satisfied) => satisfied,
        Err(e) => {
            warn!(exe = %candidate.display(), error = %e, "Skipping candidate");
            false
        }
    }
}
