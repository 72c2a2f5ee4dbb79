//! core
//!
//! Core domain types, formats, and file operations for wcadm.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Revision, EntryName, EntryId, Attributes, etc.
//! - [`time`] - Timestamp encoding for time-valued attributes
//! - [`xml`] - Tag stream reading and writing
//! - [`entries`] - The entries document and its operations
//! - [`ops`] - Transactional file replacement and locking
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for administrative areas
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Documents are rewritten in one streaming pass and replaced atomically
//! - Parsing is strict; malformed input is reported, never guessed at

pub mod config;
pub mod entries;
pub mod ops;
pub mod paths;
pub mod time;
pub mod types;
pub mod xml;
