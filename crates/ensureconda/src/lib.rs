//! ensureconda - ensure a conda-compatible package manager is available
//!
//! The binary searches for `mamba`, `micromamba`, `conda` and
//! `conda-standalone` (in that order), checks each candidate against a
//! minimum version and, if nothing qualifies, installs micromamba or
//! conda-standalone. The resolution logic lives in [`ensureconda_core`];
//! this crate adds argument parsing, logging setup and exit codes.

/// CLI argument parsing and exit codes.
pub mod cli;
/// Tracing subscriber setup.
pub mod tracing;
