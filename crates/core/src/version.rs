//! Comparable version values.
//!
//! conda, mamba and the anaconda.org listing all report versions in slightly
//! different shapes (`23.5.0`, `2.0.8`, `4.10.3.post1`, `v1.5`). Ordering
//! follows the numeric release segment, then the first pre-, post- or
//! dev-release label: `4.8.2.dev0 < 4.8.2rc1 < 4.8.2 < 4.8.2.post1`. Local
//! labels (`+g1234`) are ignored.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::{Error, Result};

#[allow(clippy::expect_used)]
static RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^v?(\d+(?:\.\d+)*)(?:[-_.]?(alpha|a|beta|b|c|rc|preview|pre|dev|post|rev|r)[-_.]?(\d*))?",
    )
    .expect("release pattern is valid")
});

/// Position of a version relative to its release, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Stage {
    Dev(u64),
    Alpha(u64),
    Beta(u64),
    Candidate(u64),
    Final,
    Post(u64),
}

impl Stage {
    fn from_label(label: &str, number: u64) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "dev" => Self::Dev(number),
            "a" | "alpha" => Self::Alpha(number),
            "b" | "beta" => Self::Beta(number),
            "c" | "rc" | "pre" | "preview" => Self::Candidate(number),
            "post" | "rev" | "r" => Self::Post(number),
            _ => Self::Final,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev(n) => write!(f, ".dev{n}"),
            Self::Alpha(n) => write!(f, "a{n}"),
            Self::Beta(n) => write!(f, "b{n}"),
            Self::Candidate(n) => write!(f, "rc{n}"),
            Self::Final => Ok(()),
            Self::Post(n) => write!(f, ".post{n}"),
        }
    }
}

/// A dot-separated numeric version with an optional release label.
///
/// Comparison is component-wise with missing components treated as zero, so
/// `1.2` and `1.2.0` are equal. Ties are broken by the label; a pre-release
/// sorts below its release.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
    stage: Stage,
}

impl Version {
    /// Create a version from its components.
    #[must_use]
    pub fn new(components: impl Into<Vec<u64>>) -> Self {
        Self {
            components: components.into(),
            stage: Stage::Final,
        }
    }

    /// The `0.0.0` sentinel used when a version could not be determined.
    #[must_use]
    pub fn zero() -> Self {
        Self::new([0, 0, 0])
    }

    /// Whether this is the zero sentinel (or any all-zero version).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.components.iter().all(|c| *c == 0)
    }

    /// The numeric components.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Whether this is a pre-release or development build.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.stage < Stage::Final
    }

    /// Parse the leading release segment of `input` and its label, if any.
    ///
    /// Anything after the first label (`+g1234`, `.post1` following `rc1`) is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if `input` does not start with a number.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidVersion {
            input: input.to_string(),
        };
        let captures = RELEASE.captures(input.trim()).ok_or_else(invalid)?;
        let components = captures[1]
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        let stage = match captures.get(2) {
            Some(label) => {
                let number = captures
                    .get(3)
                    .map_or("", |m| m.as_str())
                    .parse::<u64>()
                    .unwrap_or(0);
                Stage::from_label(label.as_str(), number)
            }
            None => Stage::Final,
        };
        Ok(Self { components, stage })
    }

    /// Parse, falling back to the zero sentinel.
    #[must_use]
    pub fn parse_or_zero(input: &str) -> Self {
        Self::parse(input).unwrap_or_else(|_| Self::zero())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let a = self.components.get(i).copied().unwrap_or(0);
                let b = other.components.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.stage.cmp(&other.stage))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        write!(f, "{}", self.stage)
    }
}
