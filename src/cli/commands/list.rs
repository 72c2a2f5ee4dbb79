//! list command - List all entries in document order

use anyhow::{Context as _, Result};

use super::require_initialized;
use crate::cli::Context;
use crate::ui::output::{self, EntryView};

/// List all entries.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;
    require_initialized(&store)?;

    let entries = store.list().context("cannot read entries")?;
    if json {
        let views: Vec<EntryView<'_>> = entries.iter().map(EntryView::from).collect();
        output::json(&views)?;
    } else {
        for entry in &entries {
            println!("{}", output::format_entry(entry));
        }
    }
    Ok(())
}
