//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! wcadm has two configuration scopes:
//! - **Global**: User-level settings
//! - **Area**: Settings for one administrative area
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Area config file
//! 4. CLI flags (not handled here)
//!
//! Time attribute lists are additive: the defaults, the global list and
//! the area list are concatenated.
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$WCADM_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/wcadm/config.toml`
//! 3. `~/.wcadm/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use wcadm::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/dir"))).unwrap();
//! println!("admin dir: {}", config.adm_dir());
//! println!("time attributes: {:?}", config.time_attributes());
//! ```

pub mod schema;

pub use schema::{AreaConfig, DisplayConfig, GlobalConfig};

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::entries::DEFAULT_TIME_ATTRIBUTES;
use crate::core::paths::{AdminPaths, DEFAULT_ADM_DIR};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence. Area config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Area configuration (if a directory was given and has one)
    pub area: Option<AreaConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the area config file (if loaded)
    area_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `dir` is provided, also loads the config of its administrative
    /// area (whose name may itself come from the global config).
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(dir: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = match Self::global_config_location() {
            Some(path) => (read_toml::<GlobalConfig>(&path)?, Some(path)),
            None => (GlobalConfig::default(), None),
        };
        Self::assemble(global, global_path, dir)
    }

    /// Load using an explicit global config file instead of the search path.
    pub fn load_with_global(global_file: &Path, dir: Option<&Path>) -> Result<Self, ConfigError> {
        let global = read_toml::<GlobalConfig>(global_file)?;
        Self::assemble(global, Some(global_file.to_path_buf()), dir)
    }

    fn assemble(
        global: GlobalConfig,
        global_path: Option<PathBuf>,
        dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        global.validate()?;

        let mut config = Config {
            global,
            area: None,
            global_path,
            area_path: None,
        };

        if let Some(dir) = dir {
            let path = config.admin_paths(dir).config_path();
            if path.exists() {
                let area = read_toml::<AreaConfig>(&path)?;
                area.validate()?;
                config.area = Some(area);
                config.area_path = Some(path);
            }
        }

        debug!(
            "config: global={:?} area={:?}",
            config.global_path, config.area_path
        );
        Ok(config)
    }

    /// First existing global config file on the search path.
    fn global_config_location() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("WCADM_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("wcadm/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".wcadm/config.toml"))
            .filter(|path| path.exists())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Name of the administrative subdirectory.
    ///
    /// Defaults to `.wc` if not configured.
    pub fn adm_dir(&self) -> &str {
        self.global.adm_dir.as_deref().unwrap_or(DEFAULT_ADM_DIR)
    }

    /// Path routing for `dir` under the configured administrative name.
    pub fn admin_paths(&self, dir: &Path) -> AdminPaths {
        AdminPaths::new(dir.to_path_buf(), self.adm_dir())
    }

    /// Attributes treated as timestamps: defaults, then global, then area,
    /// without duplicates.
    pub fn time_attributes(&self) -> Vec<String> {
        let global = self.global.time_attributes.iter().flatten();
        let area = self
            .area
            .as_ref()
            .and_then(|a| a.time_attributes.as_ref())
            .into_iter()
            .flatten();

        let mut names: Vec<String> = Vec::new();
        let all = DEFAULT_TIME_ATTRIBUTES
            .iter()
            .copied()
            .chain(global.map(String::as_str))
            .chain(area.map(String::as_str));
        for name in all {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Whether human timestamps are rendered in UTC.
    ///
    /// Defaults to `false` (local time) if not configured.
    pub fn display_utc(&self) -> bool {
        self.global
            .display
            .as_ref()
            .and_then(|d| d.utc)
            .unwrap_or(false)
    }
}

/// Read and parse a TOML config file.
fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
