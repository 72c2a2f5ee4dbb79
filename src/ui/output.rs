//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is given, output is machine-readable JSON and is printed
//! even in quiet mode.

use std::fmt::Display;

use serde::Serialize;

use crate::core::types::{Entry, EntryId};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a value as pretty JSON (always shown).
pub fn json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON view of an entry.
#[derive(Debug, Serialize)]
pub struct EntryView<'a> {
    /// `null` for the self-entry.
    pub name: Option<&'a str>,
    /// `null` when the entry is absent.
    pub version: Option<i64>,
    pub kind: crate::core::types::EntryKind,
    pub attributes: &'a crate::core::types::Attributes,
}

impl<'a> From<&'a Entry> for EntryView<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            name: entry.id.name(),
            version: entry.is_present().then(|| entry.version.as_i64()),
            kind: entry.kind,
            attributes: &entry.attributes,
        }
    }
}

/// Format an entry identity for display.
pub fn format_id(id: &EntryId) -> String {
    match id {
        EntryId::ThisDir => "(this dir)".to_string(),
        EntryId::Named(name) => name.to_string(),
    }
}

/// Format an entry as a header line followed by indented attributes.
pub fn format_entry(entry: &Entry) -> String {
    let mut lines = vec![format!(
        "{}  version {}  kind {}",
        format_id(&entry.id),
        entry.version,
        entry.kind
    )];
    lines.extend(
        entry
            .attributes
            .iter()
            .map(|(key, value)| format!("    {}={}", key, value)),
    );
    lines.join("\n")
}
