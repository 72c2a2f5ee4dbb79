//! get command - Show one entry

use anyhow::{Context as _, Result};

use super::{entry_id, require_initialized};
use crate::cli::Context;
use crate::ui::output::{self, EntryView};

/// Show one entry as text or JSON.
///
/// An absent entry is an error so that scripts can rely on the exit code.
pub fn get(ctx: &Context, name: Option<&str>, json: bool) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;
    require_initialized(&store)?;

    let id = entry_id(name)?;
    let entry = store.get(&id).context("cannot read entries")?;
    if !entry.is_present() {
        anyhow::bail!("no entry for '{}'", output::format_id(&id));
    }

    if json {
        output::json(&EntryView::from(&entry))?;
    } else {
        println!("{}", output::format_entry(&entry));
    }
    Ok(())
}
