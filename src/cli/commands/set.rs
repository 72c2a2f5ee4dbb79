//! set command - Create or overwrite an entry

use anyhow::{Context as _, Result};

use super::{entry_id, lock, require_initialized};
use crate::cli::Context;
use crate::core::types::{Attributes, EntryKind, Revision};
use crate::ui::output;

/// Create or overwrite an entry with the given version, kind and attributes.
pub fn set(
    ctx: &Context,
    name: Option<&str>,
    revision: Revision,
    kind: EntryKind,
    attrs: Vec<(String, String)>,
) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;
    require_initialized(&store)?;

    let id = entry_id(name)?;
    let attributes = Attributes::try_from_pairs(attrs).context("invalid attribute")?;

    let mut lock = lock(&store)?;
    store
        .set(&id, revision, kind, attributes)
        .context("cannot update entries")?;
    lock.release()?;

    output::print(
        format!("{} at version {}", output::format_id(&id), revision),
        ctx.verbosity(),
    );
    Ok(())
}
