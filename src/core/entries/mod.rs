//! core::entries
//!
//! The per-directory entries document and the operations on it.
//!
//! # Modules
//!
//! - [`codec`] - One entry to and from its tag
//! - [`scanner`] - Single-pass state machine for get/set/remove/list
//! - [`store`] - File-level operations with transactional replacement
//!
//! # Format
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <wc-entries xmlns="urn:wcadm:entries">
//! <entry version="0"/>
//! <entry name="foo.c" version="5" kind="file" mime-type="text/plain"/>
//! </wc-entries>
//! ```
//!
//! # Example
//!
//! ```
//! use wcadm::core::entries::EntriesStore;
//! use wcadm::core::paths::AdminPaths;
//! use wcadm::core::types::{Attributes, EntryId, EntryKind, EntryName, Revision};
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let store = EntriesStore::new(AdminPaths::with_default_name(temp.path().to_path_buf()));
//! store.init().unwrap();
//!
//! let foo = EntryId::from(EntryName::new("foo.c").unwrap());
//! let mut attrs = Attributes::new();
//! attrs.insert("mime-type", "text/plain").unwrap();
//! store.set(&foo, Revision::new(5), EntryKind::File, attrs).unwrap();
//!
//! let entry = store.get(&foo).unwrap();
//! assert_eq!(entry.version, Revision::new(5));
//! assert_eq!(entry.attributes.get("mime-type"), Some("text/plain"));
//! ```

pub mod codec;
pub mod scanner;
pub mod store;

pub use codec::{EntryFields, ENTRY_TAG};
pub use scanner::{EntryScanner, Operation, ScanError};
pub use store::{Ancestry, EntriesError, EntriesStore, DEFAULT_TIME_ATTRIBUTES};

/// Element name of the envelope around all entries.
pub const ENVELOPE_TAG: &str = "wc-entries";

/// Namespace written on new envelopes.
pub const ENTRIES_NAMESPACE: &str = "urn:wcadm:entries";
