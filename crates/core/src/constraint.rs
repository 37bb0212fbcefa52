//! Minimum-version checks.

use std::path::Path;
use tracing::info;

use crate::Result;
use crate::probe::VersionProbe;
use crate::version::Version;

/// Check whether `candidate` satisfies `min_version`.
///
/// Without a minimum the candidate is accepted without being probed.
/// Otherwise it is probed exactly once and accepted iff the probed version
/// is at least `min_version`.
///
/// # Errors
///
/// Propagates the probe error when the candidate could not be run.
pub fn satisfies(
    candidate: &Path,
    min_version: Option<&Version>,
    probe: &dyn VersionProbe,
) -> Result<bool> {
    let Some(min_version) = min_version else {
        return Ok(true);
    };

    let version = probe.probe(candidate)?;
    let satisfied = version >= *min_version;
    info!(
        exe = %candidate.display(),
        %version,
        minimum = %min_version,
        satisfied,
        "Checked version constraint"
    );
    Ok(satisfied)
}
