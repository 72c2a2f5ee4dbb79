//! core::entries::scanner
//!
//! The single-pass state machine behind every entries operation.
//!
//! # Architecture
//!
//! An [`EntryScanner`] is a [`TagHandler`]: the tokenizer feeds it tag
//! events and it decides, per event, what to record and what to emit.
//! Read operations ([`Operation::Get`], [`Operation::List`]) emit nothing.
//! Rewrite operations ([`Operation::Set`], [`Operation::Remove`]) copy every
//! tag they do not own to the output and substitute or drop the target.
//!
//! The only persistent decision state is `found`. A frame stack tracks
//! nesting so that misplaced entry tags are reported instead of silently
//! rewritten.
//!
//! # Invariants
//!
//! - The root element is the envelope; entries are its direct children and
//!   have no children of their own
//! - Untouched tags keep their order and their attributes
//! - After a rewrite there is exactly one entry per identity: duplicates of
//!   the target left behind by corruption are dropped
//! - A `set` of an absent identity appends the new entry right before the
//!   envelope closes

use std::io::{self, Write};

use log::trace;
use thiserror::Error;

use super::codec::{self, CodecError, EntryFields, ENTRY_TAG};
use super::ENVELOPE_TAG;
use crate::core::types::{Entry, EntryId, EntryName, ATTR_NAME};
use crate::core::xml::{StartTag, TagHandler, TagKind, TagWriter, XmlError};

/// Errors from scanning an entries document.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The tokenizer failed.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// The document is well-formed XML but not an entries document.
    #[error("unexpected structure: {0}")]
    Structure(String),

    /// An entry tag could not be decoded.
    #[error("bad entry: {0}")]
    Entry(#[from] CodecError),

    /// Writing the rewritten document failed.
    #[error("write error: {0}")]
    Io(#[from] io::Error),
}

/// What a scan does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Record the fields of the target entry.
    Get(EntryId),
    /// Replace (or append) the target entry with these fields.
    Set(EntryId, EntryFields),
    /// Drop the target entry.
    Remove(EntryId),
    /// Record every entry in document order.
    List,
}

impl Operation {
    /// The identity the operation is about, if any.
    pub fn target(&self) -> Option<&EntryId> {
        match self {
            Operation::Get(id) | Operation::Set(id, _) | Operation::Remove(id) => Some(id),
            Operation::List => None,
        }
    }

    /// Whether the operation produces a new document.
    pub fn rewrites(&self) -> bool {
        matches!(self, Operation::Set(..) | Operation::Remove(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Envelope,
    Entry,
    Foreign { self_closing: bool },
}

/// Result of a completed scan.
#[derive(Debug)]
pub struct ScanSummary<W> {
    /// Whether the target identity was present.
    pub found: bool,
    /// Fields of the target (`Get` only).
    pub fetched: Option<EntryFields>,
    /// All entries (`List` only).
    pub listed: Vec<Entry>,
    /// The sink, flushed (rewrites only).
    pub output: Option<W>,
}

/// Tag handler implementing one [`Operation`].
#[derive(Debug)]
pub struct EntryScanner<W: Write> {
    operation: Operation,
    found: bool,
    frames: Vec<Frame>,
    out: Option<TagWriter<W>>,
    fetched: Option<EntryFields>,
    listed: Vec<Entry>,
}

impl EntryScanner<io::Sink> {
    /// A scanner for `Get` or `List`, which emit nothing.
    pub fn reading(operation: Operation) -> Self {
        Self::build(operation, None)
    }
}

impl<W: Write> EntryScanner<W> {
    /// A scanner for `Set` or `Remove` that writes the new document to `out`.
    pub fn rewriting(operation: Operation, out: W) -> Self {
        Self::build(operation, Some(TagWriter::new(out)))
    }

    fn build(operation: Operation, out: Option<TagWriter<W>>) -> Self {
        Self {
            operation,
            found: false,
            frames: Vec::new(),
            out,
            fetched: None,
            listed: Vec::new(),
        }
    }

    /// Flush the output and hand back what the scan learned.
    pub fn finish(self) -> Result<ScanSummary<W>, ScanError> {
        let output = match self.out {
            Some(mut writer) => {
                writer.flush()?;
                Some(writer.into_inner())
            }
            None => None,
        };
        Ok(ScanSummary {
            found: self.found,
            fetched: self.fetched,
            listed: self.listed,
            output,
        })
    }

    /// Copy a tag unchanged.
    fn pass_through(&mut self, tag: &StartTag, kind: TagKind) -> Result<(), ScanError> {
        if let Some(out) = self.out.as_mut() {
            out.write_tag(kind, &tag.name, tag.attr_pairs())?;
        }
        Ok(())
    }

    fn open_envelope(&mut self, tag: &StartTag) -> Result<(), ScanError> {
        if tag.name != ENVELOPE_TAG {
            return Err(ScanError::Structure(format!(
                "root element is <{}>, expected <{}>",
                tag.name, ENVELOPE_TAG
            )));
        }
        if let Some(out) = self.out.as_mut() {
            out.write_header()?;
        }
        // Always reopened as a container so that entries can be appended.
        self.pass_through(tag, TagKind::Open)
    }

    fn close_envelope(&mut self) -> Result<(), ScanError> {
        if let Operation::Set(id, fields) = &self.operation {
            if !self.found {
                trace!("appending new entry {id}");
                if let Some(out) = self.out.as_mut() {
                    codec::encode(out, id, fields)?;
                }
                self.found = true;
            }
        }
        if let Some(out) = self.out.as_mut() {
            out.write_close(ENVELOPE_TAG)?;
        }
        Ok(())
    }

    fn entry(&mut self, tag: &StartTag) -> Result<(), ScanError> {
        let name = tag.attr(ATTR_NAME);
        let fields = codec::decode(tag)?;
        let is_target = self
            .operation
            .target()
            .map_or(false, |target| target.matches(name));

        if !is_target {
            if let Operation::List = self.operation {
                let id = match name {
                    Some(name) => EntryId::Named(EntryName::new(name).map_err(|e| {
                        ScanError::Structure(format!("entry has unusable name: {e}"))
                    })?),
                    None => EntryId::ThisDir,
                };
                self.listed.push(Entry {
                    id,
                    version: fields.version,
                    kind: fields.kind,
                    attributes: fields.attributes,
                });
                return Ok(());
            }
            trace!("keeping entry {:?}", name.unwrap_or("."));
            return self.pass_through(tag, TagKind::SelfClosing);
        }

        if self.found {
            trace!("dropping duplicate of {:?}", name.unwrap_or("."));
            return Ok(());
        }
        self.found = true;

        match &self.operation {
            Operation::Get(_) => {
                trace!("fetched {:?}", name.unwrap_or("."));
                self.fetched = Some(fields);
            }
            Operation::Set(id, new_fields) => {
                trace!("replacing entry {id}");
                if let Some(out) = self.out.as_mut() {
                    codec::encode(out, id, new_fields)?;
                }
            }
            Operation::Remove(id) => trace!("removing entry {id}"),
            Operation::List => {}
        }
        Ok(())
    }
}

impl<W: Write> TagHandler for EntryScanner<W> {
    type Error = ScanError;

    fn start_tag(&mut self, tag: &StartTag) -> Result<(), ScanError> {
        let frame = match self.frames.last().copied() {
            None => {
                self.open_envelope(tag)?;
                Frame::Envelope
            }
            Some(Frame::Envelope) if tag.name == ENTRY_TAG => {
                self.entry(tag)?;
                Frame::Entry
            }
            Some(Frame::Envelope) | Some(Frame::Foreign { .. }) => {
                if tag.name == ENTRY_TAG {
                    return Err(ScanError::Structure(format!(
                        "<{ENTRY_TAG}> nested inside a foreign element"
                    )));
                }
                let kind = if tag.self_closing {
                    TagKind::SelfClosing
                } else {
                    TagKind::Open
                };
                self.pass_through(tag, kind)?;
                Frame::Foreign {
                    self_closing: tag.self_closing,
                }
            }
            Some(Frame::Entry) => {
                return Err(ScanError::Structure(format!(
                    "<{}> inside <{ENTRY_TAG}>",
                    tag.name
                )));
            }
        };
        self.frames.push(frame);
        Ok(())
    }

    fn end_tag(&mut self, name: &str) -> Result<(), ScanError> {
        match self.frames.pop() {
            Some(Frame::Envelope) => self.close_envelope(),
            Some(Frame::Entry) | Some(Frame::Foreign { self_closing: true }) => Ok(()),
            Some(Frame::Foreign { self_closing: false }) => {
                if let Some(out) = self.out.as_mut() {
                    out.write_close(name)?;
                }
                Ok(())
            }
            None => Err(ScanError::Structure(format!("unexpected </{name}>"))),
        }
    }
}
