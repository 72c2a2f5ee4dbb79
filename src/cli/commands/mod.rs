//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Parses command-specific arguments into domain types
//! 2. Takes the area lock if it mutates
//! 3. Calls the entries store
//! 4. Formats and displays output

mod ancestry;
mod completion;
mod get;
mod init;
mod list;
mod remove;
mod set;
mod time;

// Re-export command functions for testing and direct invocation
pub use ancestry::ancestry;
pub use completion::completion;
pub use get::get;
pub use init::init;
pub use list::list;
pub use remove::remove;
pub use set::set;
pub use time::time;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::entries::EntriesStore;
use crate::core::ops::AdmLock;
use crate::core::types::{EntryId, EntryName};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init => init::init(ctx),
        Command::Get { name, json } => get::get(ctx, name.as_deref(), json),
        Command::Set {
            name,
            revision,
            kind,
            attrs,
        } => set::set(ctx, name.as_deref(), revision, kind.unwrap_or_default(), attrs),
        Command::Remove { name } => remove::remove(ctx, &name),
        Command::List { json } => list::list(ctx, json),
        Command::Ancestry { name } => ancestry::ancestry(ctx, name.as_deref()),
        Command::Time { action } => time::time(ctx, action),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Parse an optional command-line name into an entry identity.
fn entry_id(name: Option<&str>) -> Result<EntryId> {
    match name {
        None | Some(".") => Ok(EntryId::ThisDir),
        Some(name) => Ok(EntryId::Named(parse_name(name)?)),
    }
}

fn parse_name(name: &str) -> Result<EntryName> {
    EntryName::new(name).with_context(|| format!("invalid entry name '{}'", name))
}

/// Fail early with a readable message when the area was never initialized.
fn require_initialized(store: &EntriesStore) -> Result<()> {
    if !store.exists() {
        anyhow::bail!(
            "{} has no administrative area (run 'wcadm init')",
            store.paths().dir().display()
        );
    }
    Ok(())
}

/// Take the area lock for a mutating command.
fn lock(store: &EntriesStore) -> Result<AdmLock> {
    AdmLock::acquire(store.paths()).context("cannot lock administrative area")
}
