//! Candidate discovery.
//!
//! Candidates for a tool come from three places, most preferred first: the
//! kind's override variable, the search path, and ensureconda's own install
//! directory. Only existing files are yielded, each at most once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::EnsureConfig;
use crate::tool::ToolKind;

/// Lazily enumerates executable candidates.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    config: &'a EnsureConfig,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over `config`.
    #[must_use]
    pub fn new(config: &'a EnsureConfig) -> Self {
        Self { config }
    }

    /// Existing candidate files for `kind`, most preferred first.
    pub fn candidates(&self, kind: ToolKind) -> impl Iterator<Item = PathBuf> + 'a {
        let config = self.config;
        let mut seen = HashSet::new();

        let overridden = config.overrides.get(&kind).cloned();
        let on_path = kind
            .executable_names()
            .iter()
            .flat_map(move |name| search_path(config, name));
        let installed = config.install_path(kind);

        overridden
            .into_iter()
            .chain(on_path)
            .chain(installed)
            .filter(|path| {
                let is_file = path.is_file();
                if !is_file {
                    trace!(path = %path.display(), "Skipping missing candidate");
                }
                is_file
            })
            .filter(move |path| seen.insert(identity(path)))
            .inspect(move |path| debug!(%kind, path = %path.display(), "Found candidate"))
    }
}

fn search_path(config: &EnsureConfig, name: &str) -> Vec<PathBuf> {
    let Some(paths) = config.search_path.as_ref() else {
        return Vec::new();
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match which::which_in_all(name, Some(paths), cwd) {
        Ok(found) => found.collect(),
        Err(e) => {
            trace!(%name, error = %e, "Search path lookup failed");
            Vec::new()
        }
    }
}

fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
