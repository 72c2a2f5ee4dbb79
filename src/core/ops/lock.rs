//! core::ops::lock
//!
//! Exclusive lock on an administrative area.
//!
//! # Architecture
//!
//! Rewrites of the entries document detect, but do not prevent, concurrent
//! writers. Callers that mutate an area hold this lock for the whole
//! operation so that a second process fails fast instead of racing.
//!
//! # Storage
//!
//! - `<dir>/<adm>/lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Lock is automatically released on drop
//! - Lock acquisition is non-blocking (fails fast if locked)
//! - The lock never creates the administrative area; it must already exist
//!
//! # Example
//!
//! ```ignore
//! use wcadm::core::ops::lock::AdmLock;
//! use wcadm::core::paths::AdminPaths;
//!
//! let paths = AdminPaths::with_default_name(dir);
//! let lock = AdmLock::acquire(&paths)?;
//! // ... mutate entries ...
//! drop(lock);
//! ```

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use log::debug;
use thiserror::Error;

use crate::core::paths::AdminPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("administrative area is locked by another process")]
    AlreadyLocked,

    /// Failed to create the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on one administrative area, released on drop.
#[derive(Debug)]
pub struct AdmLock {
    path: PathBuf,
    /// `Some` while held.
    file: Option<File>,
}

impl AdmLock {
    /// Acquire the lock without blocking.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another handle holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be opened,
    ///   including when the area does not exist
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be taken
    pub fn acquire(paths: &AdminPaths) -> Result<Self, LockError> {
        let path = paths.lock_path();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("locked {}", path.display());
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(LockError::AlreadyLocked)
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Release early. Safe to call more than once.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
            debug!("unlocked {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for AdmLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
