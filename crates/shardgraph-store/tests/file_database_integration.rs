// shardgraph-store/tests/file_database_integration.rs
//! Integration tests for `FileDatabase` exercised through its public API
//! and a real temp directory, beyond the inline unit tests in
//! `src/file_database.rs`.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions favor clarity over production error handling."
)]

use std::collections::BTreeMap;

use shardgraph_core::Database;
use shardgraph_core::Payload;
use shardgraph_core::hashing::HashAlgorithm;
use shardgraph_core::hashing::hash_bytes;
use shardgraph_store::FileDatabase;

#[test]
fn keys_lists_every_saved_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = FileDatabase::new(dir.path());
    store.open().expect("open");

    let first = hash_bytes(HashAlgorithm::Sha256, b"one");
    let second = hash_bytes(HashAlgorithm::Sha256, b"two");
    store.save(&first, &Payload::Int(1)).expect("save first");
    store.save(&second, &Payload::Int(2)).expect("save second");

    let mut keys = store.keys();
    keys.sort();
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(keys, expected);
}

#[test]
fn nested_map_payload_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = FileDatabase::new(dir.path());
    store.open().expect("open");

    let mut inner = BTreeMap::new();
    inner.insert(Payload::Text("count".to_owned()), Payload::Int(3));
    inner.insert(Payload::Text("label".to_owned()), Payload::Text("widgets".to_owned()));
    let payload = Payload::Map(inner);

    let key = hash_bytes(HashAlgorithm::Sha256, b"nested");
    store.save(&key, &payload).expect("save");
    assert_eq!(store.load(&key).expect("load"), payload);
}

#[test]
fn overwriting_an_existing_key_replaces_its_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = FileDatabase::new(dir.path());
    store.open().expect("open");

    let key = hash_bytes(HashAlgorithm::Sha256, b"mutable");
    store.save(&key, &Payload::Int(1)).expect("save first value");
    store.save(&key, &Payload::Int(2)).expect("save second value");

    assert_eq!(store.load(&key).expect("load"), Payload::Int(2));
    assert_eq!(store.keys().len(), 1, "overwrite must not duplicate the index entry");
}

#[test]
fn a_store_rooted_under_a_fresh_nested_directory_creates_it_on_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("a").join("b").join("c");
    let mut store = FileDatabase::new(nested.as_path());
    store.open().expect("open creates missing parents");

    let key = hash_bytes(HashAlgorithm::Sha256, b"deep");
    store.save(&key, &Payload::Null).expect("save");
    assert_eq!(store.load(&key).expect("load"), Payload::Null);
    assert!(nested.is_dir());
}
