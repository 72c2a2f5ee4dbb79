//! core::entries::codec
//!
//! Conversion between one entry and its tag.
//!
//! # Tag shape
//!
//! ```text
//! <entry name="foo.c" version="5" kind="file" mime-type="text/plain"/>
//! ```
//!
//! - `name` is omitted for the self-entry
//! - `version` is always written, in decimal
//! - `kind` is written only for `file` and `dir`; an unknown or future kind
//!   is represented by the attribute's absence
//! - every other attribute is carried opaquely

use std::io::{self, Write};

use thiserror::Error;

use crate::core::types::{
    Attributes, EntryId, EntryKind, Revision, ATTR_KIND, ATTR_NAME, ATTR_VERSION,
};
use crate::core::xml::{StartTag, TagKind, TagWriter};

/// Element name of one entry.
pub const ENTRY_TAG: &str = "entry";

/// Errors from decoding an entry tag.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The version attribute is present but not an integer.
    #[error("invalid version '{0}'")]
    InvalidVersion(String),
}

/// The fields of an entry tag other than its identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryFields {
    /// Entry version; invalid when the attribute is absent.
    pub version: Revision,
    /// Node kind.
    pub kind: EntryKind,
    /// Everything except `name`, `version` and `kind`.
    pub attributes: Attributes,
}

/// Decode the fields of an entry tag.
///
/// An absent `version` decodes to [`Revision::INVALID`]. A `kind` other
/// than `file` or `dir` decodes to [`EntryKind::Unknown`].
pub fn decode(tag: &StartTag) -> Result<EntryFields, CodecError> {
    let mut fields = EntryFields::default();

    for (key, value) in tag.attr_pairs() {
        match key {
            ATTR_NAME => {}
            ATTR_VERSION => {
                fields.version = Revision::parse(value)
                    .map_err(|_| CodecError::InvalidVersion(value.to_string()))?;
            }
            ATTR_KIND => fields.kind = EntryKind::from_attr(Some(value)),
            _ => fields.attributes.insert_parsed(key, value),
        }
    }

    Ok(fields)
}

/// Write `fields` as a self-closing entry tag for `id`.
pub fn encode<W: Write>(
    out: &mut TagWriter<W>,
    id: &EntryId,
    fields: &EntryFields,
) -> io::Result<()> {
    let version = fields.version.to_string();

    let mut attrs: Vec<(&str, &str)> = Vec::with_capacity(fields.attributes.len() + 3);
    if let Some(name) = id.name() {
        attrs.push((ATTR_NAME, name));
    }
    attrs.push((ATTR_VERSION, version.as_str()));
    if let Some(kind) = fields.kind.as_attr() {
        attrs.push((ATTR_KIND, kind));
    }
    attrs.extend(fields.attributes.iter());

    out.write_tag(TagKind::SelfClosing, ENTRY_TAG, attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntryName;

    fn tag(pairs: &[(&str, &str)]) -> StartTag {
        StartTag {
            name: ENTRY_TAG.to_string(),
            attributes: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing: true,
        }
    }

    fn encoded(id: &EntryId, fields: &EntryFields) -> String {
        let mut out = TagWriter::new(Vec::new());
        encode(&mut out, id, fields).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    fn named(name: &str) -> EntryId {
        EntryId::Named(EntryName::new(name).unwrap())
    }

    mod decoding {
        use super::*;

        #[test]
        fn full_tag() {
            let fields = decode(&tag(&[
                ("name", "foo.c"),
                ("version", "5"),
                ("kind", "file"),
                ("mime-type", "text/plain"),
            ]))
            .unwrap();
            assert_eq!(fields.version, Revision::new(5));
            assert_eq!(fields.kind, EntryKind::File);
            assert_eq!(fields.attributes.get("mime-type"), Some("text/plain"));
            assert_eq!(fields.attributes.len(), 1);
        }

        #[test]
        fn missing_version_is_invalid() {
            let fields = decode(&tag(&[("name", "a")])).unwrap();
            assert!(!fields.version.is_valid());
        }

        #[test]
        fn non_integer_version_is_error() {
            assert_eq!(
                decode(&tag(&[("version", "five")])),
                Err(CodecError::InvalidVersion("five".into()))
            );
        }

        #[test]
        fn version_is_not_range_checked() {
            let fields = decode(&tag(&[("version", "-7")])).unwrap();
            assert_eq!(fields.version.as_i64(), -7);
        }

        #[test]
        fn unknown_kind_decodes_to_unknown() {
            let fields = decode(&tag(&[("version", "1"), ("kind", "symlink")])).unwrap();
            assert_eq!(fields.kind, EntryKind::Unknown);
            assert!(!fields.attributes.contains_key("kind"));
        }

        #[test]
        fn reserved_names_never_enter_bag() {
            let fields = decode(&tag(&[("name", "x"), ("version", "0"), ("kind", "dir")])).unwrap();
            assert!(fields.attributes.is_empty());
        }
    }

    mod encoding {
        use super::*;

        #[test]
        fn self_entry_has_no_name() {
            let fields = EntryFields {
                version: Revision::new(0),
                ..EntryFields::default()
            };
            assert_eq!(encoded(&EntryId::ThisDir, &fields), "<entry version=\"0\"/>\n");
        }

        #[test]
        fn named_entry_with_kind_and_bag() {
            let mut attributes = Attributes::new();
            attributes.insert("mime-type", "text/plain").unwrap();
            attributes.insert("committed-rev", "4").unwrap();
            let fields = EntryFields {
                version: Revision::new(5),
                kind: EntryKind::File,
                attributes,
            };
            assert_eq!(
                encoded(&named("foo.c"), &fields),
                "<entry name=\"foo.c\" version=\"5\" kind=\"file\" committed-rev=\"4\" mime-type=\"text/plain\"/>\n"
            );
        }

        #[test]
        fn unknown_kind_is_omitted() {
            let fields = EntryFields {
                version: Revision::new(2),
                kind: EntryKind::Unknown,
                attributes: Attributes::new(),
            };
            assert_eq!(
                encoded(&named("d"), &fields),
                "<entry name=\"d\" version=\"2\"/>\n"
            );
        }

        #[test]
        fn invalid_version_is_still_written() {
            let fields = EntryFields::default();
            assert_eq!(encoded(&EntryId::ThisDir, &fields), "<entry version=\"-1\"/>\n");
        }

        #[test]
        fn values_are_escaped() {
            let mut attributes = Attributes::new();
            attributes.insert("note", "a<b & \"c\"").unwrap();
            let fields = EntryFields {
                version: Revision::new(1),
                kind: EntryKind::Dir,
                attributes,
            };
            assert_eq!(
                encoded(&named("n"), &fields),
                "<entry name=\"n\" version=\"1\" kind=\"dir\" note=\"a&lt;b &amp; &quot;c&quot;\"/>\n"
            );
        }
    }
}
