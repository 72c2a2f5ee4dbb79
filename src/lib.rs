//! wcadm - Per-directory entries metadata for working copies
//!
//! Every tracked directory owns an administrative area holding one entries
//! document: a record per tracked file or subdirectory plus one for the
//! directory itself, each with a version, a kind and a bag of string
//! attributes. wcadm reads and rewrites that document crash-consistently.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, calls the store)
//! - [`core`] - Domain types, formats, the entries store and file operations
//! - [`ui`] - User output utilities
//!
//! # Correctness Invariants
//!
//! wcadm maintains the following invariants:
//!
//! 1. At most one entry per identity in a document
//! 2. A document is only ever replaced by a single rename of a complete file
//! 3. A failed write leaves the previous document untouched
//! 4. Timestamps round-trip exactly at microsecond precision

pub mod cli;
pub mod core;
pub mod ui;
