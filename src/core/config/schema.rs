//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$WCADM_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/wcadm/config.toml`
//! 3. `~/.wcadm/config.toml`
//!
//! # Area Config
//!
//! Located at `<dir>/<adm>/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing: the administrative directory
//! name must be a single path component and time attribute names must be
//! usable attribute names.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{is_xml_name, RESERVED_ATTRIBUTES};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// adm_dir = ".wc"
/// time_attributes = ["lock-time"]
///
/// [display]
/// utc = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Name of the administrative subdirectory
    pub adm_dir: Option<String>,

    /// Extra attributes holding timestamps
    pub time_attributes: Option<Vec<String>>,

    /// Output settings
    pub display: Option<DisplayConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(adm_dir) = &self.adm_dir {
            if adm_dir.is_empty()
                || adm_dir == "."
                || adm_dir == ".."
                || adm_dir.contains(['/', '\\'])
            {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid adm_dir '{}', must be a single directory name",
                    adm_dir
                )));
            }
        }

        validate_time_attributes(self.time_attributes.as_deref())
    }
}

/// Per-area configuration.
///
/// # Example
///
/// ```toml
/// time_attributes = ["conflict-time"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AreaConfig {
    /// Extra attributes holding timestamps
    pub time_attributes: Option<Vec<String>>,
}

impl AreaConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_time_attributes(self.time_attributes.as_deref())
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Render human timestamps in UTC instead of local time
    pub utc: Option<bool>,
}

fn validate_time_attributes(names: Option<&[String]>) -> Result<(), ConfigError> {
    for name in names.unwrap_or_default() {
        if RESERVED_ATTRIBUTES.contains(&name.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "'{}' is reserved and cannot be a time attribute",
                name
            )));
        }
        if !is_xml_name(name) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid time attribute name '{}'",
                name
            )));
        }
    }
    Ok(())
}
