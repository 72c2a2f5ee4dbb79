//! ancestry command - Show where an entry was derived from

use anyhow::{Context as _, Result};

use super::{entry_id, require_initialized};
use crate::cli::Context;

/// Print `<path>@<version>` for an entry, inheriting from the directory's
/// own entry where needed.
pub fn ancestry(ctx: &Context, name: Option<&str>) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;
    require_initialized(&store)?;

    let id = entry_id(name)?;
    let ancestry = store.ancestry(&id).context("cannot resolve ancestry")?;
    println!("{}@{}", ancestry.path, ancestry.version);
    Ok(())
}
