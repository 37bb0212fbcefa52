//! Locate or install a conda-compatible package manager.
//!
//! This crate provides functionality to:
//! - Discover `mamba`, `micromamba`, `conda` and `conda-standalone` via
//!   override variables, the search path and the install directory
//! - Probe candidates with `--version` and enforce minimum versions
//! - Install micromamba or conda-standalone when nothing suitable exists
//!
//! # Example
//!
//! ```ignore
//! use ensureconda_core::{EnsureConfig, EnsureOptions, Ensurer, ReqwestFetcher};
//!
//! let config = EnsureConfig::from_env();
//! let http = ReqwestFetcher::new()?;
//! let options = EnsureOptions::default();
//!
//! if let Some(exe) = Ensurer::new(&config, &http).ensure(&options, true)? {
//!     println!("{}", exe.display());
//! }
//! ```

#![warn(missing_docs)]

pub mod archive;
mod config;
mod constraint;
mod ensure;
mod error;
pub mod http;
pub mod install;
pub mod placement;
mod platform;
mod probe;
pub mod registry;
mod resolve;
pub mod retry;
mod tool;
mod version;

#[cfg(test)]
mod test_utils;

pub use config::{
    BACKOFF_VAR, CHANNEL_VAR, DEFAULT_CHANNEL, EnsureConfig, INSTALL_DIR_VAR, default_install_dir,
};
pub use constraint::satisfies;
pub use ensure::{EnsureOptions, Ensurer};
pub use error::{Error, Result};
pub use http::{HttpFetch, HttpResponse, ReqwestFetcher};
pub use install::Installer;
pub use platform::{Arch, Os, Platform};
pub use probe::{CommandProbe, ProbeStyle, VersionProbe};
pub use resolve::Resolver;
pub use retry::{Backoff, RetryConfig};
pub use tool::{Family, ToolKind};
pub use version::Version;
