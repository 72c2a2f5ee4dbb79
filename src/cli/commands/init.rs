//! init command - Create the administrative area of a directory

use anyhow::{Context as _, Result};

use super::lock;
use crate::cli::Context;
use crate::ui::output;

/// Create the administrative area with an entries document holding only
/// the directory's own entry at version 0.
pub fn init(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config)?;

    if store.exists() {
        anyhow::bail!(
            "{} is already initialized",
            store.paths().dir().display()
        );
    }

    store
        .paths()
        .ensure_dirs()
        .with_context(|| format!("cannot create {}", store.paths().adm_dir().display()))?;
    let mut lock = lock(&store)?;
    store.init().context("initialization failed")?;
    lock.release()?;

    output::print(
        format!("Initialized {}", store.paths().adm_dir().display()),
        ctx.verbosity(),
    );
    Ok(())
}
