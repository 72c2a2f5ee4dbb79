//! core::ops
//!
//! File-level primitives for mutating an administrative area.
//!
//! # Modules
//!
//! - [`staging`] - Transactional replacement of a file
//! - [`lock`] - Exclusive lock on an administrative area
//!
//! # Architecture
//!
//! Every mutating command:
//! 1. Acquires the area lock
//! 2. Stages the new document next to the old one
//! 3. On success: commits the stage with a single rename
//! 4. On failure: drops the stage, leaving the old document in place

pub mod lock;
pub mod staging;

pub use lock::{AdmLock, LockError};
pub use staging::{StagedFile, StagingError};
