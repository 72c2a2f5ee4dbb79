//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::{EntryKind, Revision};

/// wcadm - Inspect and edit per-directory entries metadata
#[derive(Parser, Debug)]
#[command(name = "wcadm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if wcadm was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the administrative area of a directory
    #[command(
        name = "init",
        long_about = "Create the administrative area of a directory.\n\n\
            Writes an entries document holding only the directory's own entry \
            at version 0. Fails if the directory already has one."
    )]
    Init,

    /// Show one entry
    #[command(
        name = "get",
        after_help = "\
EXAMPLES:
    # The directory's own entry
    wcadm get

    # A tracked file, as JSON
    wcadm get foo.c --json"
    )]
    Get {
        /// Entry name (omit for the directory's own entry)
        name: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or overwrite an entry
    #[command(
        name = "set",
        long_about = "Create or overwrite an entry.\n\n\
            The entry's previous attributes are replaced by the ones given here. \
            Time-valued attributes (text-time, prop-time and any configured \
            names) are normalised to the canonical timestamp format.",
        after_help = "\
EXAMPLES:
    wcadm set foo.c -r 5 --kind file -a mime-type=text/plain
    wcadm set -r 12 --kind dir -a ancestor=/trunk/src"
    )]
    Set {
        /// Entry name (omit for the directory's own entry)
        name: Option<String>,

        /// Version to record
        #[arg(short = 'r', long = "revision", value_name = "REV", value_parser = parse_revision)]
        revision: Revision,

        /// Node kind
        #[arg(long, value_parser = parse_kind)]
        kind: Option<EntryKind>,

        /// Attribute to record (repeatable)
        #[arg(short = 'a', long = "attr", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        attrs: Vec<(String, String)>,
    },

    /// Remove an entry
    #[command(name = "remove", visible_alias = "rm")]
    Remove {
        /// Entry name
        name: String,
    },

    /// List all entries in document order
    #[command(name = "list", visible_alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show where an entry was derived from
    #[command(name = "ancestry")]
    Ancestry {
        /// Entry name (omit for the directory's own entry)
        name: Option<String>,
    },

    /// Encode and decode timestamps
    #[command(name = "time")]
    Time {
        #[command(subcommand)]
        action: TimeAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    wcadm completion bash > ~/.local/share/bash-completion/completions/wcadm

    # Zsh
    wcadm completion zsh > ~/.zfunc/_wcadm

    # Fish
    wcadm completion fish > ~/.config/fish/completions/wcadm.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Timestamp subcommands.
#[derive(Subcommand, Debug)]
pub enum TimeAction {
    /// Print the current time in canonical form
    Now,

    /// Decode a timestamp (canonical or legacy) and print it canonically
    Parse {
        /// Timestamp text
        text: String,
    },

    /// Decode a timestamp and print it for humans
    Human {
        /// Timestamp text
        text: String,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

fn parse_kind(s: &str) -> Result<EntryKind, String> {
    s.parse::<EntryKind>().map_err(|e| e.to_string())
}

fn parse_revision(s: &str) -> Result<Revision, String> {
    let number: u64 = s
        .parse()
        .map_err(|_| format!("expected a non-negative integer, got '{}'", s))?;
    Revision::try_from(number).map_err(|e| e.to_string())
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_set() {
        let cli = Cli::try_parse_from([
            "wcadm", "set", "foo.c", "-r", "5", "--kind", "file", "-a", "mime-type=text/plain",
            "-a", "note=a=b",
        ])
        .unwrap();
        match cli.command {
            Command::Set {
                name,
                revision,
                kind,
                attrs,
            } => {
                assert_eq!(name.as_deref(), Some("foo.c"));
                assert_eq!(revision, Revision::new(5));
                assert_eq!(kind, Some(EntryKind::File));
                assert_eq!(
                    attrs,
                    vec![
                        ("mime-type".to_string(), "text/plain".to_string()),
                        ("note".to_string(), "a=b".to_string()),
                    ]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn set_requires_revision() {
        assert!(Cli::try_parse_from(["wcadm", "set", "foo.c"]).is_err());
    }

    #[test]
    fn revision_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["wcadm", "set", "-r", "18446744073709551615"]).is_err());
        assert!(Cli::try_parse_from(["wcadm", "set", "-r", "-1"]).is_err());
        let cli = Cli::try_parse_from(["wcadm", "set", "-r", "9223372036854775807"]).unwrap();
        match cli.command {
            Command::Set { revision, .. } => assert_eq!(revision.as_i64(), i64::MAX),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bad_kind_rejected() {
        assert!(Cli::try_parse_from(["wcadm", "set", "-r", "1", "--kind", "link"]).is_err());
    }

    #[test]
    fn bad_attr_rejected() {
        assert!(Cli::try_parse_from(["wcadm", "set", "-r", "1", "-a", "novalue"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["wcadm", "list", "--cwd", "/tmp", "-q"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.cwd, Some(PathBuf::from("/tmp")));
    }
}
