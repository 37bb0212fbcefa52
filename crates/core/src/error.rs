//! Error types for ensureconda operations.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for ensureconda operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or installing an executable.
///
/// Discovery-time failures ([`Error::Probe`]) are recovered by skipping the
/// candidate. Every other variant is fatal for the run that raised it.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The host OS/architecture has no conda subdir.
    #[error("Unsupported platform: {os}/{arch}")]
    #[diagnostic(code(ensureconda::platform::unsupported))]
    UnsupportedPlatform {
        /// Operating system as reported by the compiler target.
        os: String,
        /// Architecture as reported by the compiler target.
        arch: String,
    },

    /// A user-supplied version string could not be parsed.
    #[error("Invalid version '{input}'")]
    #[diagnostic(
        code(ensureconda::version::invalid),
        help("Versions are dot-separated numbers, e.g. 4.8.2")
    )]
    InvalidVersion {
        /// The rejected input.
        input: String,
    },

    /// The conda-standalone channel override is not a valid channel name.
    #[error("Invalid channel name '{channel}'")]
    #[diagnostic(
        code(ensureconda::config::channel),
        help("Channel names must be alphanumeric and may contain hyphens and underscores")
    )]
    InvalidChannel {
        /// The rejected channel name.
        channel: String,
    },

    /// Running `<exe> --version` failed.
    #[error("Failed to probe {}: {message}", path.display())]
    #[diagnostic(code(ensureconda::probe::failed))]
    Probe {
        /// The candidate executable.
        path: PathBuf,
        /// What went wrong (spawn error or exit status).
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {message}")]
    #[diagnostic(code(ensureconda::http::client))]
    HttpClient {
        /// Builder error message.
        message: String,
    },

    /// The request could not be sent or the response body could not be read.
    #[error("Request to {url} failed: {message}")]
    #[diagnostic(code(ensureconda::http::network))]
    Network {
        /// The requested URL.
        url: String,
        /// Transport error message.
        message: String,
    },

    /// The server answered with a non-retryable error status.
    #[error("Request to {url} failed with HTTP {status}")]
    #[diagnostic(code(ensureconda::http::status))]
    HttpStatus {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Every attempt ended in a transient server error.
    #[error("Could not retrieve {url} in {attempts} tries")]
    #[diagnostic(code(ensureconda::http::retry_exhausted))]
    RetryExhausted {
        /// The requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The package listing could not be decoded.
    #[error("Invalid package listing from {url}: {message}")]
    #[diagnostic(code(ensureconda::registry::invalid))]
    Registry {
        /// The listing URL.
        url: String,
        /// Decoder error message.
        message: String,
    },

    /// No conda-standalone package exists for the host subdir.
    #[error("No conda-standalone package found for {subdir} in channel '{channel}'")]
    #[diagnostic(code(ensureconda::registry::no_candidates))]
    NoMatchingPackage {
        /// The channel that was queried.
        channel: String,
        /// The host subdir.
        subdir: String,
    },

    /// The downloaded payload is neither a `.tar.bz2` nor a `.conda` archive.
    #[error("Unrecognized archive format downloaded from {url}")]
    #[diagnostic(code(ensureconda::archive::unrecognized))]
    UnrecognizedArchive {
        /// Where the payload came from.
        url: String,
    },

    /// The archive could not be read.
    #[error("Failed to read archive: {message}")]
    #[diagnostic(code(ensureconda::archive::corrupt))]
    Archive {
        /// Decoder error message.
        message: String,
    },

    /// The requested file is not inside the archive.
    #[error("'{member}' not found in archive")]
    #[diagnostic(code(ensureconda::archive::member_missing))]
    MemberMissing {
        /// The archive member that was looked for.
        member: String,
    },

    /// I/O error with path context.
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(ensureconda::io::error))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable.
        path: Option<Box<Path>>,
        /// Description of the operation that failed.
        operation: String,
    },
}

impl Error {
    /// Create an I/O error with context.
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a probe error.
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an archive error.
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Create a missing-member error.
    pub fn member_missing(member: impl Into<String>) -> Self {
        Self::MemberMissing {
            member: member.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_path_and_operation() {
        let err = Error::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            "/opt/ensureconda/micromamba",
            "rename",
        );
        match &err {
            Error::Io {
                path, operation, ..
            } => {
                assert_eq!(path.as_deref(), Some(Path::new("/opt/ensureconda/micromamba")));
                assert_eq!(operation, "rename");
            }
            _ => panic!("Expected Io error"),
        }
        assert!(err.to_string().contains("rename"));
    }

    #[test]
    fn test_display_messages() {
        let err = Error::NoMatchingPackage {
            channel: "anaconda".into(),
            subdir: "linux-64".into(),
        };
        assert_eq!(
            err.to_string(),
            "No conda-standalone package found for linux-64 in channel 'anaconda'"
        );

        let err = Error::RetryExhausted {
            url: "https://example.invalid".into(),
            attempts: 10,
        };
        assert!(err.to_string().contains("10 tries"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = Error::member_missing("bin/micromamba");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("ensureconda::archive::member_missing"));
    }
}
