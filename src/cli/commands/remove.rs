//! remove command - Remove an entry

use anyhow::{Context as _, Result};

use super::{lock, parse_name, require_initialized};
use crate::cli::Context;
use crate::ui::output;

/// Remove a named entry. Removing an absent entry is not an error.
pub fn remove(ctx: &Context, name: &str) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;
    require_initialized(&store)?;

    let name = parse_name(name)?;
    let mut lock = lock(&store)?;
    let removed = store.remove(&name).context("cannot update entries")?;
    lock.release()?;

    if removed {
        output::print(format!("Removed {}", name), ctx.verbosity());
    } else {
        output::warn(format!("no entry for '{}'", name), ctx.verbosity());
    }
    Ok(())
}
