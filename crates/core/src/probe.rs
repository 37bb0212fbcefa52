//! Version probing of candidate executables.
//!
//! Every candidate is run with `--version` and its output parsed according to
//! the tool's [`ProbeStyle`]. Typical outputs:
//!
//! ```text
//! $ conda --version          $ mamba --version (v1)     $ micromamba --version
//! conda 23.5.0               mamba 1.4.7                1.5.8
//!                            conda 23.5.0
//! ```
//!
//! mamba 2 prints micromamba-style output, so the mamba parser falls back to
//! the micromamba rule when no `mamba` line is present.

use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::version::Version;
use crate::{Error, Result};

/// How `--version` output is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStyle {
    /// First line starting with `conda`; trailing token.
    Conda,
    /// First line starting with `mamba`, else [`ProbeStyle::Micromamba`].
    Mamba,
    /// Trailing token of the first line.
    Micromamba,
}

impl ProbeStyle {
    /// Parse `--version` output into a version.
    ///
    /// Output that carries no recognizable version yields [`Version::zero`].
    #[must_use]
    pub fn parse_output(self, output: &str) -> Version {
        let token = match self {
            Self::Conda => prefixed_line_token(output, "conda"),
            Self::Mamba => {
                prefixed_line_token(output, "mamba").or_else(|| first_line_token(output))
            }
            Self::Micromamba => first_line_token(output),
        };
        match token {
            Some(token) => Version::parse(token).unwrap_or_else(|_| {
                warn!(%token, style = ?self, "Unparseable version token");
                Version::zero()
            }),
            None => {
                debug!(style = ?self, "No version line in output");
                Version::zero()
            }
        }
    }
}

fn prefixed_line_token<'a>(output: &'a str, tool: &str) -> Option<&'a str> {
    output
        .trim()
        .lines()
        .find(|line| line.starts_with(tool))
        .and_then(|line| line.split_whitespace().last())
}

fn first_line_token(output: &str) -> Option<&str> {
    output
        .trim()
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().last())
}

/// Strategy that determines the version of an executable.
pub trait VersionProbe {
    /// Determine the version of `exe`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Probe`] if the executable could not be run or exited
    /// unsuccessfully. Unparseable output is not an error; it yields the
    /// zero sentinel.
    fn probe(&self, exe: &Path) -> Result<Version>;
}

/// Probes by running `<exe> --version` as a subprocess.
#[derive(Debug, Clone, Copy)]
pub struct CommandProbe {
    style: ProbeStyle,
}

impl CommandProbe {
    /// Create a probe using the given parsing rule.
    #[must_use]
    pub fn new(style: ProbeStyle) -> Self {
        Self { style }
    }
}

impl VersionProbe for CommandProbe {
    fn probe(&self, exe: &Path) -> Result<Version> {
        debug!(exe = %exe.display(), style = ?self.style, "Determining version");
        let output = Command::new(exe)
            .arg("--version")
            .output()
            .map_err(|e| Error::probe(exe, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::probe(
                exe,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = self.style.parse_output(&stdout);
        debug!(exe = %exe.display(), %version, "Determined version");
        Ok(version)
    }
}
