use clap::Parser;
use ensureconda_core::{EnsureConfig, EnsureOptions, Ensurer, ReqwestFetcher, Version};
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::tracing::{TracingConfig, TracingFormat, level_for_verbosity};

/// A compatible executable was found; its path is on stdout.
pub const EXIT_FOUND: i32 = 0;
/// Nothing compatible was found.
pub const EXIT_NOT_FOUND: i32 = 1;
/// Resolution or installation failed.
pub const EXIT_FATAL: i32 = 2;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(ensureconda::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Failure raised while resolving or installing
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ensure(#[from] ensureconda_core::Error),
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } | CliError::Ensure(_) => EXIT_FATAL,
    }
}

/// Render an error as a miette diagnostic on stderr
pub fn render_error(err: CliError) {
    let report = Report::new(err);
    #[allow(clippy::print_stderr)]
    {
        eprintln!("{report:?}");
    }
    let _ = io::stderr().flush();
}

fn parse_version(s: &str) -> Result<Version, String> {
    Version::parse(s).map_err(|e| e.to_string())
}

/// Ensures that a conda/mamba is installed.
///
/// Prints the path of the first compatible executable on stdout. If none is
/// found, micromamba or conda-standalone is downloaded into the install
/// directory (`ENSURECONDA_INSTALL_DIR`) unless `--no-install` is given.
#[derive(Parser, Debug)]
#[command(name = "ensureconda")]
#[command(about = "Ensures that a conda/mamba is installed.")]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Search for mamba
    #[arg(long, overrides_with = "no_mamba")]
    pub mamba: bool,
    /// Do not search for mamba
    #[arg(long, overrides_with = "mamba")]
    pub no_mamba: bool,

    /// Search for micromamba, install if not present
    #[arg(long, overrides_with = "no_micromamba")]
    pub micromamba: bool,
    /// Do not search for or install micromamba
    #[arg(long, overrides_with = "micromamba")]
    pub no_micromamba: bool,

    /// Search for conda
    #[arg(long, overrides_with = "no_conda")]
    pub conda: bool,
    /// Do not search for conda
    #[arg(long, overrides_with = "conda")]
    pub no_conda: bool,

    /// Search for conda-standalone, install if not present
    #[arg(long, overrides_with = "no_conda_exe")]
    pub conda_exe: bool,
    /// Do not search for or install conda-standalone
    #[arg(long, overrides_with = "conda_exe")]
    pub no_conda_exe: bool,

    /// Never download anything
    #[arg(long)]
    pub no_install: bool,

    /// Minimum acceptable conda (and conda-standalone) version
    #[arg(long, default_value = "4.8.2", value_parser = parse_version)]
    pub min_conda_version: Version,

    /// Minimum acceptable mamba (and micromamba) version
    #[arg(long, default_value = "0.7.3", value_parser = parse_version)]
    pub min_mamba_version: Version,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long = "verbosity", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = TracingFormat::Compact)]
    pub log_format: TracingFormat,
}

impl Cli {
    /// Search options selected on the command line.
    #[must_use]
    pub fn options(&self) -> EnsureOptions {
        EnsureOptions {
            mamba: !self.no_mamba,
            micromamba: !self.no_micromamba,
            conda: !self.no_conda,
            conda_standalone: !self.no_conda_exe,
            min_conda_version: Some(self.min_conda_version.clone()),
            min_mamba_version: Some(self.min_mamba_version.clone()),
        }
    }

    /// Tracing setup selected on the command line.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            level: level_for_verbosity(self.verbosity),
            filter: None,
        }
    }
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Search without installing, then, if nothing was found and installation is
/// allowed, search again with installation permitted.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or an install fails.
pub fn run(cli: &Cli) -> Result<Option<PathBuf>, CliError> {
    let config = EnsureConfig::from_env();
    let http = ReqwestFetcher::new()?;
    let ensurer = Ensurer::new(&config, &http);
    let options = cli.options();

    if let Some(found) = ensurer.ensure(&options, false)? {
        return Ok(Some(found));
    }
    if cli.no_install {
        debug!("Installation disabled");
        return Ok(None);
    }
    Ok(ensurer.ensure(&options, true)?)
}
