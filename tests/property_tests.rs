//! Property-based tests for the timestamp codec and the entries store.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use tempfile::TempDir;

use wcadm::core::entries::EntriesStore;
use wcadm::core::paths::AdminPaths;
use wcadm::core::time;
use wcadm::core::types::{Attributes, EntryId, EntryKind, EntryName, Revision};

/// Strategy for instants between year 1 and year 9999 at microsecond precision.
fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (-62_135_596_800i64..=253_402_300_799i64, 0u32..1_000_000).prop_map(|(secs, micros)| {
        Utc.timestamp_opt(secs, micros * 1000)
            .single()
            .expect("in range")
    })
}

/// Strategy for attribute names that are not reserved or time-valued.
fn attribute_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,10}".prop_filter("reserved or time-valued", |name| {
        !matches!(
            name.as_str(),
            "name" | "version" | "kind" | "text-time" | "prop-time"
        )
    })
}

/// Strategy for attribute values, including characters that need escaping.
fn attribute_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\PC{0,20}",
        "[<>&\"' \t\na-z]{0,12}",
    ]
}

/// Strategy for entry names.
fn entry_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,12}".prop_filter("dot names", |n| n != "." && n != "..")
}

fn kind() -> impl Strategy<Value = EntryKind> {
    prop_oneof![
        Just(EntryKind::Unknown),
        Just(EntryKind::File),
        Just(EntryKind::Dir),
    ]
}

fn fresh_store() -> (TempDir, EntriesStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = EntriesStore::new(AdminPaths::with_default_name(dir.path().to_path_buf()));
    store.init().expect("init");
    (dir, store)
}

proptest! {
    /// Every representable instant survives encode then decode exactly.
    #[test]
    fn timestamp_roundtrip(when in instant()) {
        let text = time::to_cstring(&when);
        prop_assert_eq!(text.len(), 27);
        prop_assert_eq!(time::from_cstring(&text).unwrap(), when);
    }

    /// The human rendering always starts with a parseable prefix and stays short.
    #[test]
    fn human_rendering_is_bounded(when in instant()) {
        let text = time::to_human_cstring_in(&when, &Utc);
        prop_assert!(text.len() < time::MAX_HUMAN_LENGTH);
        let expected_prefix = format!("{} +0000", when.format("%Y-%m-%d %H:%M:%S"));
        prop_assert!(text.starts_with(&expected_prefix));
    }

    /// Decoding never panics on arbitrary input.
    #[test]
    fn decode_arbitrary_text(text in "\\PC{0,80}") {
        let _ = time::from_cstring(&text);
    }

    /// Whatever decodes, including out-of-range clock fields, re-encodes in
    /// the fixed-width stored format.
    #[test]
    fn decoded_fields_reencode_at_fixed_width(
        year in -2i64..10_002,
        month in 0i64..14,
        day in 0i64..33,
        hour in 0i64..25,
        minute in 0i64..61,
        second in 0i64..62,
        micros in -3_000_000i64..3_000_000,
    ) {
        let text = format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{micros:06}Z");
        if let Ok(when) = time::from_cstring(&text) {
            let encoded = time::to_cstring(&when);
            prop_assert_eq!(encoded.len(), 27);
            prop_assert_eq!(time::from_cstring(&encoded).unwrap(), when);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Whatever is set is exactly what is read back.
    #[test]
    fn set_then_get(
        name in entry_name(),
        version in 0u32..1_000_000,
        kind in kind(),
        pairs in prop::collection::btree_map(attribute_name(), attribute_value(), 0..6),
    ) {
        let (_dir, store) = fresh_store();
        let id = EntryId::Named(EntryName::new(name).unwrap());
        let attributes = Attributes::try_from_pairs(pairs.clone()).unwrap();

        store.set(&id, Revision::new(version), kind, attributes.clone()).unwrap();
        let entry = store.get(&id).unwrap();

        prop_assert_eq!(entry.version, Revision::new(version));
        prop_assert_eq!(entry.kind, kind);
        prop_assert_eq!(entry.attributes, attributes);
    }

    /// Entries keep their relative order across any sequence of sets and removes.
    #[test]
    fn order_is_stable(
        names in prop::collection::vec(entry_name(), 1..8),
        removed in prop::collection::vec(any::<bool>(), 8),
    ) {
        let (_dir, store) = fresh_store();
        let mut expected: Vec<String> = Vec::new();
        for name in &names {
            let id = EntryId::Named(EntryName::new(name.clone()).unwrap());
            store.set(&id, Revision::new(1), EntryKind::File, Attributes::new()).unwrap();
            if !expected.contains(name) {
                expected.push(name.clone());
            }
        }

        let mut gone = BTreeMap::new();
        for (name, remove) in names.iter().zip(removed) {
            if remove {
                store.remove(&EntryName::new(name.clone()).unwrap()).unwrap();
                gone.insert(name.clone(), ());
            }
        }
        expected.retain(|n| !gone.contains_key(n));

        let listed: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .filter_map(|e| e.id.name().map(str::to_string))
            .collect();
        prop_assert_eq!(listed, expected);
    }
}
