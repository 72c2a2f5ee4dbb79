//! time command - Encode and decode timestamps

use anyhow::{Context as _, Result};
use chrono::Utc;

use crate::cli::args::TimeAction;
use crate::cli::Context;
use crate::core::time;

/// Run a timestamp subcommand.
pub fn time(ctx: &Context, action: TimeAction) -> Result<()> {
    match action {
        TimeAction::Now => println!("{}", time::to_cstring(&Utc::now())),
        TimeAction::Parse { text } => {
            let when = time::from_cstring(&text).with_context(|| format!("cannot parse '{}'", text))?;
            println!("{}", time::to_cstring(&when));
        }
        TimeAction::Human { text } => {
            let when = time::from_cstring(&text).with_context(|| format!("cannot parse '{}'", text))?;
            let config = ctx.config()?;
            let rendered = if config.display_utc() {
                time::to_human_cstring_in(&when, &Utc)
            } else {
                time::to_human_cstring(&when)
            };
            println!("{}", rendered);
        }
    }
    Ok(())
}
