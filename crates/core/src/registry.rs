//! anaconda.org package listings.
//!
//! The `/package/<channel>/<name>/files` endpoint returns one record per
//! uploaded artifact:
//!
//! ```json
//! [{"size": 12345, "attrs": {"subdir": "linux-64", "build_number": 0,
//!   "timestamp": 1700000000}, "type": "conda", "version": "23.11.0",
//!   "download_url": "//api.anaconda.org/download/anaconda/conda-standalone/..."}]
//! ```

use serde::Deserialize;
use tracing::debug;

use crate::version::Version;
use crate::{Error, Result};

/// Per-artifact attributes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageAttrs {
    /// Platform subdir, e.g. `linux-64`.
    pub subdir: String,
    /// Build number within a version.
    #[serde(default)]
    pub build_number: u64,
    /// Upload timestamp; absent on older uploads.
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// One artifact in a package listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRecord {
    /// Artifact size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Platform and build attributes.
    pub attrs: PackageAttrs,
    /// Artifact type as reported by the registry.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Package version string.
    pub version: String,
    /// Download location, usually protocol-relative.
    pub download_url: String,
}

impl PackageRecord {
    /// Ordering key: `(version, build_number, timestamp)`.
    ///
    /// Unparseable versions sort as `0.0.0`; a missing timestamp as 0.
    #[must_use]
    pub fn sort_key(&self) -> (Version, u64, u64) {
        (
            Version::parse_or_zero(&self.version),
            self.attrs.build_number,
            self.attrs.timestamp.unwrap_or(0),
        )
    }

    /// Absolute download URL.
    #[must_use]
    pub fn download_url(&self) -> String {
        if self.download_url.starts_with("//") {
            format!("https:{}", self.download_url)
        } else {
            self.download_url.clone()
        }
    }
}

/// URL of the conda-standalone file listing in `channel`.
#[must_use]
pub fn listing_url(api_url: &str, channel: &str) -> String {
    format!(
        "{}/package/{channel}/conda-standalone/files",
        api_url.trim_end_matches('/')
    )
}

/// Decode a listing body.
///
/// # Errors
///
/// Returns [`Error::Registry`] if `body` is not a JSON array of records.
pub fn parse_listing(url: &str, body: &[u8]) -> Result<Vec<PackageRecord>> {
    let records: Vec<PackageRecord> =
        serde_json::from_slice(body).map_err(|e| Error::Registry {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    debug!(%url, count = records.len(), "Decoded package listing");
    Ok(records)
}

/// The newest record built for `subdir`, if any.
#[must_use]
pub fn select_latest<'a>(records: &'a [PackageRecord], subdir: &str) -> Option<&'a PackageRecord> {
    records
        .iter()
        .filter(|record| record.attrs.subdir == subdir)
        .max_by_key(|record| record.sort_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: &str, build_number: u64, timestamp: Option<u64>, subdir: &str) -> PackageRecord {
        PackageRecord {
            size: 1,
            attrs: PackageAttrs {
                subdir: subdir.to_string(),
                build_number,
                timestamp,
            },
            kind: "conda".to_string(),
            version: version.to_string(),
            download_url: format!("//api.example/{version}-{build_number}"),
        }
    }

    #[test]
    fn test_select_latest_orders_by_version_build_timestamp() {
        let records = vec![
            record("1.2", 0, Some(50), "linux-64"),
            record("1.10", 0, Some(10), "osx-64"),
            record("1.2", 0, Some(40), "linux-64"),
        ];
        let selected = select_latest(&records, "linux-64").unwrap();
        assert_eq!(selected.version, "1.2");
        assert_eq!(selected.attrs.build_number, 0);
        assert_eq!(selected.attrs.timestamp, Some(50));
    }

    #[test]
    fn test_version_compares_numerically() {
        let records = vec![
            record("4.9.0", 3, Some(900), "linux-64"),
            record("4.10.0", 0, Some(100), "linux-64"),
        ];
        assert_eq!(select_latest(&records, "linux-64").unwrap().version, "4.10.0");
    }

    #[test]
    fn test_build_number_breaks_version_ties() {
        let records = vec![
            record("23.1.0", 1, Some(10), "win-64"),
            record("23.1.0", 2, Some(5), "win-64"),
        ];
        assert_eq!(select_latest(&records, "win-64").unwrap().attrs.build_number, 2);
    }

    #[test]
    fn test_missing_timestamp_sorts_first() {
        let records = vec![
            record("1.0", 0, None, "linux-64"),
            record("1.0", 0, Some(1), "linux-64"),
        ];
        assert_eq!(
            select_latest(&records, "linux-64").unwrap().attrs.timestamp,
            Some(1)
        );
    }

    #[test]
    fn test_unparseable_version_sorts_as_zero() {
        let records = vec![
            record("nightly", 99, Some(99), "linux-64"),
            record("0.1", 0, Some(1), "linux-64"),
        ];
        assert_eq!(select_latest(&records, "linux-64").unwrap().version, "0.1");
    }

    #[test]
    fn test_no_record_for_subdir() {
        let records = vec![record("1.0", 0, None, "osx-arm64")];
        assert!(select_latest(&records, "linux-64").is_none());
        assert!(select_latest(&[], "linux-64").is_none());
    }

    #[test]
    fn test_download_url_gets_scheme() {
        let mut rec = record("1.0", 0, None, "linux-64");
        rec.download_url = "//api.anaconda.org/download/x.conda".to_string();
        assert_eq!(rec.download_url(), "https://api.anaconda.org/download/x.conda");

        rec.download_url = "http://mirror.local/x.conda".to_string();
        assert_eq!(rec.download_url(), "http://mirror.local/x.conda");
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url("https://api.anaconda.org/", "anaconda"),
            "https://api.anaconda.org/package/anaconda/conda-standalone/files"
        );
    }

    #[test]
    fn test_parse_listing_ignores_unknown_fields() {
        let body = br#"[
            {"size": 42, "attrs": {"subdir": "linux-64", "build_number": 1,
             "timestamp": 1700000000, "arch": "x86_64"}, "type": "conda",
             "version": "23.11.0", "download_url": "//host/file.conda",
             "md5": "abc", "ndownloads": 7},
            {"attrs": {"subdir": "noarch"}, "version": "1.0",
             "download_url": "//host/other.tar.bz2"}
        ]"#;
        let records = parse_listing("https://host/files", body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, "conda");
        assert_eq!(records[0].attrs.timestamp, Some(1_700_000_000));
        assert_eq!(records[1].attrs.build_number, 0);
        assert_eq!(records[1].attrs.timestamp, None);
    }

    #[test]
    fn test_parse_listing_rejects_garbage() {
        let err = parse_listing("https://host/files", b"<html>").unwrap_err();
        assert!(matches!(err, Error::Registry { .. }));
        let err = parse_listing("https://host/files", br#"{"error": "not found"}"#).unwrap_err();
        assert!(matches!(err, Error::Registry { .. }));
    }
}
