//! core::ops::staging
//!
//! Transactional replacement of an administrative file.
//!
//! # Architecture
//!
//! A [`StagedFile`] is a writable handle bound to a hidden staging path next
//! to (or below) the file it will replace:
//!
//! 1. [`StagedFile::begin`] exclusively creates the staging file
//! 2. The caller streams the new content through [`std::io::Write`]
//! 3. [`StagedFile::commit`] flushes, fsyncs, and renames it over the target
//!
//! Dropping a staged file without committing removes the staging file and
//! leaves the target untouched.
//!
//! # Invariants
//!
//! - The target is only ever replaced by a single rename of a fully synced file
//! - An existing staging file is never overwritten; it signals a conflicting
//!   writer or crash debris and is reported as [`StagingError::Conflict`]
//! - The staging file must be on the same filesystem as the target
//!
//! # Example
//!
//! ```ignore
//! use std::io::Write;
//! use wcadm::core::ops::staging::StagedFile;
//!
//! let mut staged = StagedFile::begin(&target, &staging)?;
//! staged.write_all(b"new content")?;
//! staged.commit()?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

/// Errors from staging operations.
#[derive(Debug, Error)]
pub enum StagingError {
    /// A staging file already exists at the staging path.
    #[error("staging file already exists: {}", .0.display())]
    Conflict(PathBuf),

    /// I/O error while creating, writing or publishing the staging file.
    #[error("staging i/o error: {0}")]
    Io(#[from] io::Error),
}

/// An uncommitted replacement for a file.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    staging: PathBuf,
    /// `None` once committed.
    out: Option<BufWriter<File>>,
}

impl StagedFile {
    /// Exclusively create `staging` as the future content of `target`.
    ///
    /// # Errors
    ///
    /// - [`StagingError::Conflict`] if `staging` already exists
    /// - [`StagingError::Io`] for any other creation failure
    pub fn begin(target: &Path, staging: &Path) -> Result<Self, StagingError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staging)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    StagingError::Conflict(staging.to_path_buf())
                } else {
                    StagingError::Io(e)
                }
            })?;

        debug!("staging {} as {}", target.display(), staging.display());
        Ok(Self {
            target: target.to_path_buf(),
            staging: staging.to_path_buf(),
            out: Some(BufWriter::new(file)),
        })
    }

    /// The file this stage will replace.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The hidden staging path.
    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Publish the staged content over the target.
    ///
    /// On failure the staging file is removed and the target is untouched.
    pub fn commit(mut self) -> Result<(), StagingError> {
        let out = match self.out.take() {
            Some(out) => out,
            None => return Ok(()),
        };

        let publish = || -> io::Result<()> {
            let file = out.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
            drop(file);
            fs::rename(&self.staging, &self.target)?;
            sync_parent(&self.target)
        };

        match publish() {
            Ok(()) => {
                debug!("committed {}", self.target.display());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&self.staging);
                Err(StagingError::Io(e))
            }
        }
    }

    /// Throw the staged content away.
    pub fn discard(mut self) {
        self.remove_staging();
    }

    fn remove_staging(&mut self) {
        if self.out.take().is_some() {
            warn!("discarding uncommitted {}", self.staging.display());
            let _ = fs::remove_file(&self.staging);
        }
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.out
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "staged file already committed"))
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        #[cfg(any(test, feature = "fault_injection"))]
        if fault_injection::should_crash() {
            // Leave a torn write behind, as a crash would.
            let half = buf.len() / 2;
            self.writer()?.write_all(&buf[..half])?;
            self.writer()?.flush()?;
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "simulated crash for fault injection testing",
            ));
        }

        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.remove_staging();
    }
}

/// Make a completed rename durable.
#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Fault injection for crash testing.
///
/// Only available with `cfg(test)` or the `fault_injection` feature.
/// Each `write` on a [`StagedFile`] counts as one write.
///
/// ```ignore
/// use wcadm::core::ops::staging::fault_injection;
///
/// // The third write fails halfway through its buffer
/// fault_injection::set_crash_after(3);
/// // ...
/// fault_injection::reset();
/// ```
#[cfg(any(test, feature = "fault_injection"))]
pub mod fault_injection {
    use std::cell::Cell;

    thread_local! {
        /// Fail the Nth write; 0 disables.
        static CRASH_AFTER_WRITES: Cell<usize> = const { Cell::new(0) };

        static WRITE_COUNT: Cell<usize> = const { Cell::new(0) };
    }

    /// Fail the `n`th write from now on. `0` disables.
    pub fn set_crash_after(n: usize) {
        CRASH_AFTER_WRITES.with(|c| c.set(n));
        WRITE_COUNT.with(|c| c.set(0));
    }

    /// Count a write and report whether it should fail.
    pub fn should_crash() -> bool {
        CRASH_AFTER_WRITES.with(|threshold_cell| {
            let threshold = threshold_cell.get();
            if threshold == 0 {
                return false;
            }
            WRITE_COUNT.with(|count_cell| {
                let count = count_cell.get() + 1;
                count_cell.set(count);
                count >= threshold
            })
        })
    }

    /// Disable fault injection and clear the counter.
    pub fn reset() {
        CRASH_AFTER_WRITES.with(|c| c.set(0));
        WRITE_COUNT.with(|c| c.set(0));
    }

    /// Writes counted since the last `set_crash_after`.
    pub fn write_count() -> usize {
        WRITE_COUNT.with(|c| c.get())
    }
}
