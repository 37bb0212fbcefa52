//! Single-member extraction from conda package archives.
//!
//! Two package formats are in circulation:
//!
//! - legacy `.tar.bz2`: a bzip2-compressed tarball;
//! - `.conda`: a zip holding `info-*.tar.zst` and `pkg-*.tar.zst`, where the
//!   `pkg` component carries the package files.
//!
//! The micromamba endpoint always serves `.tar.bz2`, while the registry may
//! serve either, so the format is sniffed from the payload itself.

use bzip2::read::BzDecoder;
use std::io::{self, Cursor, Read, Write};
use tar::Archive;
use tracing::{debug, trace};

use crate::{Error, Result};

const BZIP2_MAGIC: &[u8] = b"BZh";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Component of a `.conda` archive that holds the package payload.
pub const CONDA_PKG_COMPONENT: &str = "pkg";

/// Archive container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// bzip2-compressed tarball.
    TarBz2,
    /// zip of zstd-compressed tarballs.
    Conda,
}

impl ArchiveFormat {
    /// Detect the format from the leading bytes of `data`.
    #[must_use]
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(BZIP2_MAGIC) {
            Some(Self::TarBz2)
        } else if data.starts_with(ZIP_MAGIC) {
            Some(Self::Conda)
        } else {
            None
        }
    }
}

/// Copy `member` out of an archive into `out`, returning the bytes written.
///
/// # Errors
///
/// Returns [`Error::MemberMissing`] if the member (or, for `.conda`, the
/// `pkg` component) is absent and [`Error::Archive`] if the archive is corrupt.
pub fn extract_member(
    format: ArchiveFormat,
    data: &[u8],
    member: &str,
    out: &mut dyn Write,
) -> Result<u64> {
    match format {
        ArchiveFormat::TarBz2 => extract_from_tar_bz2(data, member, out),
        ArchiveFormat::Conda => extract_from_conda(data, CONDA_PKG_COMPONENT, member, out),
    }
}

/// Copy `member` out of a `.tar.bz2` payload.
///
/// # Errors
///
/// See [`extract_member`].
pub fn extract_from_tar_bz2(data: &[u8], member: &str, out: &mut dyn Write) -> Result<u64> {
    debug!(%member, bytes = data.len(), "Extracting from tar.bz2");
    copy_from_tar(BzDecoder::new(Cursor::new(data)), member, out)
}

/// Copy `member` out of the `component` tarball of a `.conda` payload.
///
/// # Errors
///
/// See [`extract_member`].
pub fn extract_from_conda(
    data: &[u8],
    component: &str,
    member: &str,
    out: &mut dyn Write,
) -> Result<u64> {
    debug!(%member, %component, bytes = data.len(), "Extracting from .conda");
    let mut zip = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::archive(format!("failed to open .conda: {e}")))?;

    let prefix = format!("{component}-");
    let name = zip
        .file_names()
        .find(|name| name.starts_with(&prefix) && name.ends_with(".tar.zst"))
        .map(str::to_string)
        .ok_or_else(|| Error::member_missing(format!("{component}-*.tar.zst")))?;
    trace!(%name, "Found component");

    let entry = zip
        .by_name(&name)
        .map_err(|e| Error::archive(format!("failed to read {name}: {e}")))?;
    let decoder = zstd::stream::read::Decoder::new(entry)
        .map_err(|e| Error::archive(format!("failed to decode {name}: {e}")))?;
    copy_from_tar(decoder, member, out)
}

fn copy_from_tar<R: Read>(reader: R, member: &str, out: &mut dyn Write) -> Result<u64> {
    let wanted = normalize(member);
    let mut archive = Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| Error::archive(format!("failed to read tar: {e}")))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| Error::archive(format!("failed to read tar entry: {e}")))?;
        let path = entry
            .path()
            .map_err(|e| Error::archive(format!("invalid path in tar: {e}")))?;
        // tar entries may or may not carry a leading ./
        if normalize(&path.to_string_lossy()) != wanted {
            continue;
        }

        let written = io::copy(&mut entry, out)
            .map_err(|e| Error::archive(format!("failed to extract {member}: {e}")))?;
        debug!(%member, bytes = written, "Extracted member");
        return Ok(written);
    }

    Err(Error::member_missing(member))
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./")
        .trim_start_matches('/')
        .replace('\\', "/")
}
