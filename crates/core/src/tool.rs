//! The package-manager executables ensureconda knows about.

use crate::platform::Platform;
use crate::probe::ProbeStyle;

/// One of the conda-compatible package managers, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    /// `mamba`, the accelerated conda front-end.
    Mamba,
    /// `micromamba`, the static single-binary mamba.
    Micromamba,
    /// `conda` itself.
    Conda,
    /// The self-contained conda build from the `conda-standalone` package.
    CondaStandalone,
}

/// Which minimum-version constraint applies to a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// conda and conda-standalone.
    Conda,
    /// mamba and micromamba.
    Mamba,
}

impl ToolKind {
    /// All kinds in resolution priority order.
    pub const ALL: [Self; 4] = [
        Self::Mamba,
        Self::Micromamba,
        Self::Conda,
        Self::CondaStandalone,
    ];

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mamba => "mamba",
            Self::Micromamba => "micromamba",
            Self::Conda => "conda",
            Self::CondaStandalone => "conda-standalone",
        }
    }

    /// Executable names searched for on PATH.
    #[must_use]
    pub fn executable_names(self) -> &'static [&'static str] {
        match self {
            Self::Mamba => &["mamba"],
            Self::Micromamba => &["micromamba"],
            Self::Conda => &["conda"],
            Self::CondaStandalone => &["conda_standalone"],
        }
    }

    /// Environment variable that pins an explicit executable path.
    #[must_use]
    pub fn override_var(self) -> &'static str {
        match self {
            Self::Mamba => "MAMBA_EXE",
            Self::Micromamba => "MICROMAMBA_EXE",
            Self::Conda => "CONDA_EXE",
            Self::CondaStandalone => "CONDA_STANDALONE_EXE",
        }
    }

    /// File name the installer writes into the install directory, if this
    /// kind can be installed.
    #[must_use]
    pub fn installed_file_name(self, platform: &Platform) -> Option<String> {
        let stem = match self {
            Self::Micromamba => "micromamba",
            Self::CondaStandalone => "conda_standalone",
            Self::Mamba | Self::Conda => return None,
        };
        Some(format!("{stem}{}", platform.exe_suffix()))
    }

    /// Whether ensureconda can install this kind itself.
    #[must_use]
    pub fn is_installable(self) -> bool {
        matches!(self, Self::Micromamba | Self::CondaStandalone)
    }

    /// Constraint family.
    #[must_use]
    pub fn family(self) -> Family {
        match self {
            Self::Mamba | Self::Micromamba => Family::Mamba,
            Self::Conda | Self::CondaStandalone => Family::Conda,
        }
    }

    /// How `--version` output of this kind is parsed.
    #[must_use]
    pub fn probe_style(self) -> ProbeStyle {
        match self {
            Self::Mamba => ProbeStyle::Mamba,
            Self::Micromamba => ProbeStyle::Micromamba,
            Self::Conda | Self::CondaStandalone => ProbeStyle::Conda,
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
