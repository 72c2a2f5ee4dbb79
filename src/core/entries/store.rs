//! core::entries::store
//!
//! File-level entries operations for one administrative area.
//!
//! # Architecture
//!
//! Every operation is one streaming pass over `<adm>/entries`:
//!
//! - `get`, `list`, `ancestry` and `timestamp` read the document in place
//! - `set` and `remove` stream the rewritten document into
//!   `<adm>/tmp/entries` and commit it over the original with one rename
//!
//! Any failure while rewriting drops the staging file; the original is
//! never modified in place. The store does not lock. Callers that may run
//! concurrently hold [`AdmLock`](crate::core::ops::AdmLock) around each call.
//!
//! # Time-valued attributes
//!
//! Attributes named in the store's time attribute list are normalised on
//! `set`: a value in the primary or legacy timestamp grammar is rewritten in
//! the primary grammar, and any other value is rejected with
//! [`EntriesError::BadDate`].

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use thiserror::Error;

use super::codec::{self, EntryFields};
use super::scanner::{EntryScanner, Operation, ScanError};
use super::{ENTRIES_NAMESPACE, ENVELOPE_TAG};
use crate::core::ops::{StagedFile, StagingError};
use crate::core::paths::AdminPaths;
use crate::core::time;
use crate::core::types::{
    Attributes, Entry, EntryId, EntryKind, EntryName, Revision, ATTR_ANCESTOR,
};
use crate::core::xml::{self, TagKind, TagWriter, XmlError};

/// Attributes treated as timestamps unless configured otherwise.
pub const DEFAULT_TIME_ATTRIBUTES: [&str; 2] = ["text-time", "prop-time"];

/// Errors from entries operations.
///
/// Every variant names the directory and the entry involved.
#[derive(Debug, Error)]
pub enum EntriesError {
    /// The document is not a well-formed entries document.
    #[error("{}: malformed entries document (entry '{entry}'): {message}", .path.display())]
    MalformedDocument {
        path: PathBuf,
        entry: EntryId,
        message: String,
    },

    /// Neither the entry nor the self-entry records an ancestor.
    #[error("{}: entry '{entry}' has no ancestry", .path.display())]
    MissingAncestry { path: PathBuf, entry: EntryId },

    /// A time-valued attribute matches no timestamp grammar.
    #[error("{}: entry '{entry}': attribute '{attribute}' has bad date '{value}'", .path.display())]
    BadDate {
        path: PathBuf,
        entry: EntryId,
        attribute: String,
        value: String,
    },

    /// Reading or writing an administrative file failed.
    #[error("{}: entry '{entry}': {source}", .path.display())]
    Io {
        path: PathBuf,
        entry: EntryId,
        #[source]
        source: io::Error,
    },

    /// A staging file is already present.
    #[error("{}: entry '{entry}': another write is in progress or was interrupted ({})", .path.display(), .staging.display())]
    WriteConflict {
        path: PathBuf,
        entry: EntryId,
        staging: PathBuf,
    },
}

impl EntriesError {
    /// The directory whose entries were being accessed.
    pub fn path(&self) -> &Path {
        match self {
            EntriesError::MalformedDocument { path, .. }
            | EntriesError::MissingAncestry { path, .. }
            | EntriesError::BadDate { path, .. }
            | EntriesError::Io { path, .. }
            | EntriesError::WriteConflict { path, .. } => path,
        }
    }

    /// The entry the operation was about.
    pub fn entry(&self) -> &EntryId {
        match self {
            EntriesError::MalformedDocument { entry, .. }
            | EntriesError::MissingAncestry { entry, .. }
            | EntriesError::BadDate { entry, .. }
            | EntriesError::Io { entry, .. }
            | EntriesError::WriteConflict { entry, .. } => entry,
        }
    }
}

/// Where an entry was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestry {
    /// Repository path of the ancestor.
    pub path: String,
    /// Version of the ancestor.
    pub version: Revision,
}

/// Entries operations on one administrative area.
#[derive(Debug, Clone)]
pub struct EntriesStore {
    paths: AdminPaths,
    time_attributes: Vec<String>,
}

impl EntriesStore {
    /// A store for the area routed by `paths`, with the default time attributes.
    pub fn new(paths: AdminPaths) -> Self {
        Self {
            paths,
            time_attributes: DEFAULT_TIME_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the list of attributes treated as timestamps.
    pub fn with_time_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.time_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Path routing for this area.
    pub fn paths(&self) -> &AdminPaths {
        &self.paths
    }

    /// Attributes normalised as timestamps on `set`.
    pub fn time_attributes(&self) -> &[String] {
        &self.time_attributes
    }

    /// Whether the entries document exists.
    pub fn exists(&self) -> bool {
        self.paths.entries_path().is_file()
    }

    /// Create the administrative area and a document holding only the
    /// self-entry at version 0.
    ///
    /// # Errors
    ///
    /// [`EntriesError::Io`] if the document already exists or cannot be
    /// written; [`EntriesError::WriteConflict`] on staging debris.
    pub fn init(&self) -> Result<(), EntriesError> {
        let id = EntryId::ThisDir;
        let target = self.paths.entries_path();
        if target.exists() {
            return Err(self.io_error(
                &id,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists", target.display()),
                ),
            ));
        }

        self.paths.ensure_dirs().map_err(|e| self.io_error(&id, e))?;
        let staged = self.begin(&id)?;

        let mut out = TagWriter::new(staged);
        let fields = EntryFields {
            version: Revision::new(0),
            kind: EntryKind::Unknown,
            attributes: Attributes::new(),
        };
        let written = (|| -> io::Result<()> {
            out.write_header()?;
            out.write_tag(TagKind::Open, ENVELOPE_TAG, [("xmlns", ENTRIES_NAMESPACE)])?;
            codec::encode(&mut out, &id, &fields)?;
            out.write_close(ENVELOPE_TAG)?;
            out.flush()
        })();
        written.map_err(|e| self.io_error(&id, e))?;

        self.commit(&id, out.into_inner())?;
        debug!("initialized {}", self.paths.adm_dir().display());
        Ok(())
    }

    /// Look up one entry.
    ///
    /// An absent entry is not an error: the result has an invalid version,
    /// unknown kind and no attributes (see [`Entry::is_present`]).
    pub fn get(&self, id: &EntryId) -> Result<Entry, EntriesError> {
        let mut scanner = EntryScanner::reading(Operation::Get(id.clone()));
        self.scan(id, &mut scanner)?;
        let summary = scanner.finish().map_err(|e| self.scan_error(id, e))?;

        debug!("get {} in {}: found={}", id, self.paths.dir().display(), summary.found);
        Ok(match summary.fetched {
            Some(fields) => Entry {
                id: id.clone(),
                version: fields.version,
                kind: fields.kind,
                attributes: fields.attributes,
            },
            None => Entry::absent(id.clone()),
        })
    }

    /// Every entry in document order.
    pub fn list(&self) -> Result<Vec<Entry>, EntriesError> {
        let id = EntryId::ThisDir;
        let mut scanner = EntryScanner::reading(Operation::List);
        self.scan(&id, &mut scanner)?;
        let summary = scanner.finish().map_err(|e| self.scan_error(&id, e))?;
        Ok(summary.listed)
    }

    /// Create or overwrite an entry.
    ///
    /// The previous attributes of the entry are replaced, not merged.
    pub fn set(
        &self,
        id: &EntryId,
        version: Revision,
        kind: EntryKind,
        mut attributes: Attributes,
    ) -> Result<(), EntriesError> {
        self.normalize_times(id, &mut attributes)?;
        let fields = EntryFields {
            version,
            kind,
            attributes,
        };
        let found = self.rewrite(id, Operation::Set(id.clone(), fields))?;
        debug!(
            "set {} in {}: {}",
            id,
            self.paths.dir().display(),
            if found { "replaced" } else { "created" }
        );
        Ok(())
    }

    /// Remove a named entry. Removing an absent entry succeeds.
    ///
    /// Returns whether an entry was actually dropped.
    pub fn remove(&self, name: &EntryName) -> Result<bool, EntriesError> {
        let id = EntryId::Named(name.clone());
        let found = self.rewrite(&id, Operation::Remove(id.clone()))?;
        debug!("remove {} in {}: found={}", id, self.paths.dir().display(), found);
        Ok(found)
    }

    /// Resolve where an entry came from.
    ///
    /// A named entry without its own `ancestor` attribute inherits the
    /// self-entry's ancestor path joined with its name; one without a valid
    /// version inherits the self-entry's version.
    pub fn ancestry(&self, id: &EntryId) -> Result<Ancestry, EntriesError> {
        let entry = self.get(id)?;
        let mut path = entry.attributes.get(ATTR_ANCESTOR).map(str::to_string);
        let mut version = Some(entry.version).filter(Revision::is_valid);

        if let Some(name) = id.name() {
            if path.is_none() || version.is_none() {
                let parent = self.get(&EntryId::ThisDir)?;
                if path.is_none() {
                    path = parent
                        .attributes
                        .get(ATTR_ANCESTOR)
                        .map(|base| join_ancestor(base, name));
                }
                if version.is_none() {
                    version = Some(parent.version).filter(Revision::is_valid);
                }
            }
        }

        match (path, version) {
            (Some(path), Some(version)) => Ok(Ancestry { path, version }),
            _ => Err(EntriesError::MissingAncestry {
                path: self.paths.dir().to_path_buf(),
                entry: id.clone(),
            }),
        }
    }

    /// Decode a time-valued attribute of an entry.
    ///
    /// Returns `None` when the entry or the attribute is absent.
    pub fn timestamp(
        &self,
        id: &EntryId,
        attribute: &str,
    ) -> Result<Option<DateTime<Utc>>, EntriesError> {
        let entry = self.get(id)?;
        entry
            .attributes
            .get(attribute)
            .map(|value| self.decode_time(id, attribute, value))
            .transpose()
    }

    fn normalize_times(&self, id: &EntryId, attributes: &mut Attributes) -> Result<(), EntriesError> {
        for name in &self.time_attributes {
            if let Some(value) = attributes.get(name) {
                let when = self.decode_time(id, name, value)?;
                attributes.replace_value(name, time::to_cstring(&when));
            }
        }
        Ok(())
    }

    fn decode_time(
        &self,
        id: &EntryId,
        attribute: &str,
        value: &str,
    ) -> Result<DateTime<Utc>, EntriesError> {
        time::from_cstring(value).map_err(|_| EntriesError::BadDate {
            path: self.paths.dir().to_path_buf(),
            entry: id.clone(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
    }

    /// Stream the current document through a reading scanner.
    fn scan(&self, id: &EntryId, scanner: &mut EntryScanner<io::Sink>) -> Result<(), EntriesError> {
        let input = self.open(id)?;
        xml::parse(input, scanner).map_err(|e| self.scan_error(id, e))
    }

    /// Rewrite the document through `operation`, returning whether the target
    /// was present.
    fn rewrite(&self, id: &EntryId, operation: Operation) -> Result<bool, EntriesError> {
        let input = self.open(id)?;
        let staged = self.begin(id)?;

        let mut scanner = EntryScanner::rewriting(operation, staged);
        xml::parse(input, &mut scanner).map_err(|e| self.scan_error(id, e))?;
        let summary = scanner.finish().map_err(|e| self.scan_error(id, e))?;

        if let Some(staged) = summary.output {
            self.commit(id, staged)?;
        }
        Ok(summary.found)
    }

    fn open(&self, id: &EntryId) -> Result<BufReader<File>, EntriesError> {
        File::open(self.paths.entries_path())
            .map(BufReader::new)
            .map_err(|e| self.io_error(id, e))
    }

    fn begin(&self, id: &EntryId) -> Result<StagedFile, EntriesError> {
        StagedFile::begin(&self.paths.entries_path(), &self.paths.entries_staging_path())
            .map_err(|e| self.staging_error(id, e))
    }

    fn commit(&self, id: &EntryId, staged: StagedFile) -> Result<(), EntriesError> {
        staged.commit().map_err(|e| self.staging_error(id, e))
    }

    fn io_error(&self, id: &EntryId, source: io::Error) -> EntriesError {
        EntriesError::Io {
            path: self.paths.dir().to_path_buf(),
            entry: id.clone(),
            source,
        }
    }

    fn staging_error(&self, id: &EntryId, err: StagingError) -> EntriesError {
        match err {
            StagingError::Conflict(staging) => EntriesError::WriteConflict {
                path: self.paths.dir().to_path_buf(),
                entry: id.clone(),
                staging,
            },
            StagingError::Io(e) => self.io_error(id, e),
        }
    }

    fn scan_error(&self, id: &EntryId, err: ScanError) -> EntriesError {
        match err {
            ScanError::Xml(XmlError::Io(e)) | ScanError::Io(e) => self.io_error(id, e),
            other => EntriesError::MalformedDocument {
                path: self.paths.dir().to_path_buf(),
                entry: id.clone(),
                message: other.to_string(),
            },
        }
    }
}

fn join_ancestor(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}
