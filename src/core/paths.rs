//! core::paths
//!
//! Centralized path routing for administrative areas.
//!
//! # Architecture
//!
//! Every tracked directory owns one administrative area, a hidden
//! subdirectory (`.wc` by default) holding its metadata. All locations
//! inside that area are computed here.
//!
//! **Hard rule:** No code outside this module joins the administrative
//! directory name onto a path. All paths must go through `AdminPaths`.
//!
//! # Storage Layout
//!
//! Everything lives under `<dir>/<adm>/`:
//! - `entries` - The entries document
//! - `tmp/` - Staging area for in-flight rewrites
//! - `tmp/entries` - Staging file for the entries document
//! - `lock` - Exclusive lock file
//! - `config.toml` - Area configuration
//!
//! # Example
//!
//! ```
//! use wcadm::core::paths::AdminPaths;
//! use std::path::PathBuf;
//!
//! let paths = AdminPaths::new(PathBuf::from("/work/src"), ".wc");
//!
//! assert_eq!(paths.entries_path(), PathBuf::from("/work/src/.wc/entries"));
//! assert_eq!(
//!     paths.entries_staging_path(),
//!     PathBuf::from("/work/src/.wc/tmp/entries")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Default name of the administrative subdirectory.
pub const DEFAULT_ADM_DIR: &str = ".wc";

/// Path routing for one directory's administrative area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPaths {
    /// The tracked directory that owns the area.
    dir: PathBuf,
    /// Name of the administrative subdirectory.
    adm_name: String,
}

impl AdminPaths {
    /// Create routing for `dir` with the given administrative directory name.
    pub fn new(dir: PathBuf, adm_name: impl Into<String>) -> Self {
        Self {
            dir,
            adm_name: adm_name.into(),
        }
    }

    /// Routing for `dir` using [`DEFAULT_ADM_DIR`].
    pub fn with_default_name(dir: PathBuf) -> Self {
        Self::new(dir, DEFAULT_ADM_DIR)
    }

    /// The tracked directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The administrative subdirectory name.
    pub fn adm_name(&self) -> &str {
        &self.adm_name
    }

    /// The administrative area itself.
    pub fn adm_dir(&self) -> PathBuf {
        self.dir.join(&self.adm_name)
    }

    /// The entries document.
    pub fn entries_path(&self) -> PathBuf {
        self.adm_dir().join("entries")
    }

    /// Directory holding staging files.
    pub fn tmp_dir(&self) -> PathBuf {
        self.adm_dir().join("tmp")
    }

    /// Staging file for the entries document.
    pub fn entries_staging_path(&self) -> PathBuf {
        self.tmp_dir().join("entries")
    }

    /// The lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.adm_dir().join("lock")
    }

    /// Area configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.adm_dir().join("config.toml")
    }

    /// Ensure the area and its staging directory exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.tmp_dir())
    }
}
