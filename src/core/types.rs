//! core::types
//!
//! Strong types for the entries store.
//!
//! # Types
//!
//! - [`Revision`] - Entry version with an explicit invalid sentinel
//! - [`EntryKind`] - Node kind recorded on an entry
//! - [`EntryName`] - Validated name of a tracked file or subdirectory
//! - [`EntryId`] - Identity of an entry (the directory itself or a named child)
//! - [`Attributes`] - Open-ended bag of string attributes
//! - [`Entry`] - One decoded record of an entries file
//!
//! # Validation
//!
//! Names and attribute keys are validated at construction time, so a value
//! that made it into one of these types can always be serialized back into
//! a well-formed entries file.
//!
//! # Examples
//!
//! ```
//! use wcadm::core::types::{Attributes, EntryId, EntryName, Revision};
//!
//! let name = EntryName::new("foo.c").unwrap();
//! let id = EntryId::from(name);
//! assert!(id.matches(Some("foo.c")));
//!
//! let mut attrs = Attributes::new();
//! attrs.insert("mime-type", "text/plain").unwrap();
//! assert!(attrs.insert("version", "3").is_err());
//!
//! assert!(!Revision::INVALID.is_valid());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribute carrying the entry name.
pub const ATTR_NAME: &str = "name";

/// Attribute carrying the entry version.
pub const ATTR_VERSION: &str = "version";

/// Attribute carrying the entry kind.
pub const ATTR_KIND: &str = "kind";

/// Attribute carrying the ancestor path used by ancestry resolution.
pub const ATTR_ANCESTOR: &str = "ancestor";

/// Attribute names that travel in typed fields rather than in [`Attributes`].
pub const RESERVED_ATTRIBUTES: [&str; 3] = [ATTR_NAME, ATTR_VERSION, ATTR_KIND];

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid entry name: {0}")]
    InvalidEntryName(String),

    #[error("invalid attribute name: {0}")]
    InvalidAttributeName(String),

    #[error("attribute '{0}' is reserved and cannot be set directly")]
    ReservedAttribute(String),

    #[error("invalid entry kind: {0}")]
    InvalidKind(String),

    #[error("invalid revision: {0}")]
    InvalidRevision(String),
}

// ============================================================================
// Revision
// ============================================================================

/// An entry version.
///
/// Versions are non-negative integers. A missing `version` attribute decodes
/// to [`Revision::INVALID`], which is also what `get` reports for an entry
/// that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    /// The invalid sentinel.
    pub const INVALID: Revision = Revision(-1);

    /// Create a valid revision.
    ///
    /// Wider values go through `TryFrom<u64>`, which refuses anything that
    /// does not fit the on-disk signed range.
    pub fn new(number: u32) -> Self {
        Self(i64::from(number))
    }

    /// Create a revision from a raw signed value.
    ///
    /// Negative values are representable (they are all invalid), which is
    /// what parsing an on-disk `version` attribute needs.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Parse the decimal form used in the `version` attribute.
    ///
    /// Only integer syntax is checked; there is no range validation.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        text.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidRevision(text.to_string()))
    }

    /// Whether this is a usable version number.
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    /// Get the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl TryFrom<u64> for Revision {
    type Error = TypeError;

    fn try_from(number: u64) -> Result<Self, TypeError> {
        i64::try_from(number)
            .map(Self)
            .map_err(|_| TypeError::InvalidRevision(number.to_string()))
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// EntryKind
// ============================================================================

/// The node kind recorded on an entry.
///
/// Anything other than `file` or `dir` on disk decodes to `Unknown`, and
/// `Unknown` is written as an absent `kind` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Unknown,
    File,
    Dir,
}

impl EntryKind {
    /// Decode the `kind` attribute value.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("file") => EntryKind::File,
            Some("dir") => EntryKind::Dir,
            _ => EntryKind::Unknown,
        }
    }

    /// The `kind` attribute value, or `None` when the attribute is omitted.
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            EntryKind::File => Some("file"),
            EntryKind::Dir => Some("dir"),
            EntryKind::Unknown => None,
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(EntryKind::File),
            "dir" => Ok(EntryKind::Dir),
            "unknown" => Ok(EntryKind::Unknown),
            other => Err(TypeError::InvalidKind(other.to_string())),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_attr().unwrap_or("unknown"))
    }
}

// ============================================================================
// EntryName / EntryId
// ============================================================================

/// A validated name of a file or subdirectory tracked by an entries file.
///
/// Names are single path components:
/// - Cannot be empty, `.` or `..`
/// - Cannot contain `/`
/// - Cannot contain NUL or other control characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryName(String);

impl EntryName {
    /// Create a new validated entry name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidEntryName` if the name is not a single
    /// path component.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidEntryName(
                "entry name cannot be empty".into(),
            ));
        }
        if name == "." || name == ".." {
            return Err(TypeError::InvalidEntryName(format!(
                "entry name cannot be '{name}'"
            )));
        }
        if name.contains('/') {
            return Err(TypeError::InvalidEntryName(
                "entry name cannot contain '/'".into(),
            ));
        }
        if name.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidEntryName(
                "entry name cannot contain control characters".into(),
            ));
        }
        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntryName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntryName> for String {
    fn from(name: EntryName) -> Self {
        name.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity of an entry within one entries file.
///
/// The directory's own record has no name on disk; every other record is
/// keyed by its [`EntryName`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// The self-entry of the owning directory.
    ThisDir,
    /// A tracked file or subdirectory.
    Named(EntryName),
}

impl EntryId {
    /// Build an identity from an optional name.
    pub fn from_option(name: Option<EntryName>) -> Self {
        name.map_or(EntryId::ThisDir, EntryId::Named)
    }

    /// The on-disk `name` attribute, absent for the self-entry.
    pub fn name(&self) -> Option<&str> {
        match self {
            EntryId::ThisDir => None,
            EntryId::Named(name) => Some(name.as_str()),
        }
    }

    /// Whether a tag carrying `name` refers to this identity.
    ///
    /// Two absent names match (self-entry); two present names match when
    /// they are string-equal.
    pub fn matches(&self, name: Option<&str>) -> bool {
        match (self, name) {
            (EntryId::ThisDir, None) => true,
            (EntryId::Named(ours), Some(theirs)) => ours.as_str() == theirs,
            _ => false,
        }
    }

}

impl From<EntryName> for EntryId {
    fn from(name: EntryName) -> Self {
        EntryId::Named(name)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::ThisDir => f.write_str("."),
            EntryId::Named(name) => f.write_str(name.as_str()),
        }
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// An ordered mapping from attribute name to string value.
///
/// Keys are unique and must be valid XML attribute names. The reserved
/// names `name`, `version` and `kind` are rejected; they are carried by
/// [`EntryId`], [`Revision`] and [`EntryKind`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// Create an empty attribute bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an attribute bag from key/value pairs.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid or reserved key.
    pub fn try_from_pairs<I, K, V>(pairs: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attrs = Self::new();
        for (key, value) in pairs {
            attrs.insert(key, value)?;
        }
        Ok(attrs)
    }

    /// Insert an attribute, returning the previous value if any.
    ///
    /// # Errors
    ///
    /// - [`TypeError::ReservedAttribute`] for `name`, `version` or `kind`
    /// - [`TypeError::InvalidAttributeName`] if the key is not a valid XML name
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, TypeError> {
        let key = key.into();
        if RESERVED_ATTRIBUTES.contains(&key.as_str()) {
            return Err(TypeError::ReservedAttribute(key));
        }
        if !is_xml_name(&key) {
            return Err(TypeError::InvalidAttributeName(key));
        }
        Ok(self.0.insert(key, value.into()))
    }

    /// Insert a key that came out of a parsed document.
    ///
    /// The tokenizer already guarantees XML-name syntax.
    pub(crate) fn insert_parsed(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Get an attribute value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Check whether an attribute is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace the value of an existing attribute in place.
    pub(crate) fn replace_value(&mut self, key: &str, value: String) {
        if let Some(slot) = self.0.get_mut(key) {
            *slot = value;
        }
    }
}

/// Check XML name syntax (ASCII subset plus any non-ASCII letter).
pub(crate) fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

// ============================================================================
// Entry
// ============================================================================

/// One record of an entries file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Which entry this is.
    pub id: EntryId,
    /// The entry version, invalid if absent.
    pub version: Revision,
    /// The node kind.
    pub kind: EntryKind,
    /// All other attributes.
    pub attributes: Attributes,
}

impl Entry {
    /// The result of looking up an identity that is not in the file.
    pub fn absent(id: EntryId) -> Self {
        Self {
            id,
            version: Revision::INVALID,
            kind: EntryKind::Unknown,
            attributes: Attributes::new(),
        }
    }

    /// Whether the entry was found (its version is valid).
    pub fn is_present(&self) -> bool {
        self.version.is_valid()
    }
}
