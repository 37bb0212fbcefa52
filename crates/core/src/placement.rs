//! Atomic placement of installed executables.
//!
//! Content is streamed into a temp file beside the destination and renamed
//! over it on commit, so readers only ever see a missing file or a complete
//! one. Concurrent installers targeting the same destination are serialized
//! by an exclusive lock on `<dest>.lock`.

use fs4::fs_std::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::{Error, Result};

const TEMP_PREFIX: &str = ".ensureconda-";

/// Scoped writer for one executable.
///
/// Dropping the writer without calling [`ExecutableWriter::commit`] removes
/// the temp file and releases the lock; the destination is left untouched.
#[derive(Debug)]
pub struct ExecutableWriter {
    dest: PathBuf,
    temp: Option<NamedTempFile>,
    lock: File,
}

impl ExecutableWriter {
    /// Lock `dest` and open a temp file next to it.
    ///
    /// Blocks while another writer holds the lock for the same destination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory, lock file or temp file cannot
    /// be created, or the lock cannot be taken.
    pub fn create(dest: impl Into<PathBuf>) -> Result<Self> {
        let dest = dest.into();
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| Error::io(e, &dir, "create install directory"))?;

        let lock_path = lock_path(&dest);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Error::io(e, &lock_path, "open lock file"))?;
        trace!(lock = %lock_path.display(), "Waiting for install lock");
        FileExt::lock_exclusive(&lock).map_err(|e| Error::io(e, &lock_path, "lock"))?;

        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&dir)
            .map_err(|e| Error::io(e, &dir, "create temp file"))?;
        debug!(dest = %dest.display(), temp = %temp.path().display(), "Opened executable writer");

        Ok(Self {
            dest,
            temp: Some(temp),
            lock,
        })
    }

    /// Final location of the executable.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Make the content executable and move it onto the destination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if syncing, changing permissions or renaming fails.
    /// The temp file is removed in that case.
    pub fn commit(mut self) -> Result<PathBuf> {
        let Some(mut temp) = self.temp.take() else {
            return Err(Error::io(
                io::Error::other("writer already committed"),
                &self.dest,
                "commit",
            ));
        };

        temp.flush()
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| Error::io(e, temp.path(), "sync"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o755))
                .map_err(|e| Error::io(e, temp.path(), "chmod"))?;
        }

        temp.persist(&self.dest)
            .map_err(|e| Error::io(e.error, &self.dest, "rename"))?;
        debug!(dest = %self.dest.display(), "Committed executable");
        Ok(self.dest.clone())
    }

    fn temp_mut(&mut self) -> io::Result<&mut NamedTempFile> {
        self.temp
            .as_mut()
            .ok_or_else(|| io::Error::other("writer already committed"))
    }
}

impl Write for ExecutableWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.temp_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.temp_mut()?.flush()
    }
}

impl Drop for ExecutableWriter {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            trace!(temp = %temp.path().display(), "Discarding uncommitted executable");
            drop(temp);
        }
        let _ = FileExt::unlock(&self.lock);
    }
}

/// Atomically write `contents` to `dest` as an executable.
///
/// # Errors
///
/// See [`ExecutableWriter::create`] and [`ExecutableWriter::commit`].
pub fn write_executable(dest: impl Into<PathBuf>, contents: &[u8]) -> Result<PathBuf> {
    let mut writer = ExecutableWriter::create(dest)?;
    writer
        .write_all(contents)
        .map_err(|e| Error::io(e, writer.dest().to_path_buf(), "write"))?;
    writer.commit()
}

fn lock_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map_or_else(OsString::new, OsString::from);
    name.push(".lock");
    dest.with_file_name(name)
}
