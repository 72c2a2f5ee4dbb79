//! cli
//!
//! Command-line interface layer for wcadm.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve the target directory and configuration
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers build an
//! [`EntriesStore`](crate::core::entries::EntriesStore) from the
//! [`Context`] and hold the area lock around every mutating call.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::core::entries::EntriesStore;
use crate::ui::output::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// The directory whose administrative area commands operate on.
    pub fn dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("cannot determine current directory"),
        }
    }

    /// Load configuration for the target directory.
    pub fn config(&self) -> Result<Config> {
        let dir = self.dir()?;
        Config::load(Some(&dir)).context("failed to load configuration")
    }

    /// Build the entries store for the target directory.
    pub fn store(&self, config: &Config) -> Result<EntriesStore> {
        let dir = self.dir()?;
        Ok(EntriesStore::new(config.admin_paths(&dir))
            .with_time_attributes(config.time_attributes()))
    }

    /// Output verbosity from flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    run_with(cli)
}

/// Run an already-parsed command line.
pub fn run_with(cli: Cli) -> Result<()> {
    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
