//! Tests for the embedding store

use super::*;
use crate::embedding::HashingEmbedder;
use std::path::Path;
use tempfile::TempDir;

fn store() -> EmbeddingStore {
    EmbeddingStore::new(Arc::new(HashingEmbedder::new(32)))
}

#[test]
fn upsert_records_text_and_embedding() {
    let mut store = store();
    let embedding = store.upsert(Path::new("/docs/a.txt"), "neural networks");

    assert_eq!(store.len(), 1);
    assert_eq!(embedding.len(), 32);
    assert_eq!(store.content_of(Path::new("/docs/a.txt")), Some("neural networks"));
    assert_eq!(store.embedding_of(Path::new("/docs/a.txt")), Some(embedding.as_slice()));
}

#[test]
fn upsert_overwrites_existing_record() {
    let mut store = store();
    store.upsert(Path::new("/docs/a.txt"), "first version");
    store.upsert(Path::new("/docs/a.txt"), "second version");

    assert_eq!(store.len(), 1);
    assert_eq!(store.content_of(Path::new("/docs/a.txt")), Some("second version"));
}

#[test]
fn blank_text_records_zero_vector() {
    let mut store = store();
    let embedding = store.upsert(Path::new("/docs/empty.txt"), "   \n ");

    assert_eq!(embedding, vec![0.0; 32]);
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_and_clear() {
    let mut store = store();
    store.upsert(Path::new("/docs/a.txt"), "alpha");
    store.upsert(Path::new("/docs/b.txt"), "beta");

    store.remove(Path::new("/docs/a.txt"));
    assert_eq!(store.len(), 1);

    // Removing something unknown is a no-op
    store.remove(Path::new("/docs/ghost.txt"));
    assert_eq!(store.len(), 1);

    store.clear();
    assert!(store.is_empty());

    // Clear on empty is a no-op too
    store.clear();
    assert!(store.is_empty());
}

#[test]
fn rename_rekeys_without_reembedding() {
    let mut store = store();
    let original = store.upsert(Path::new("/docs/a.txt"), "alpha");
    store.rename(Path::new("/docs/a.txt"), Path::new("/docs/Topic/a.txt"));

    assert!(store.embedding_of(Path::new("/docs/a.txt")).is_none());
    assert_eq!(
        store.embedding_of(Path::new("/docs/Topic/a.txt")),
        Some(original.as_slice())
    );
    assert_eq!(store.content_of(Path::new("/docs/Topic/a.txt")), Some("alpha"));
}

#[test]
fn save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join("clusters.bin");

    let mut store_a = store();
    store_a.upsert(Path::new("/docs/a.txt"), "neural networks lecture");
    store_a.upsert(Path::new("/docs/b.txt"), "grocery list");
    store_a.save(&state_file).unwrap();

    let mut store_b = store();
    store_b.load(&state_file);

    assert_eq!(store_b.embeddings(), store_a.embeddings());
    assert_eq!(store_b.contents(), store_a.contents());
}

#[test]
fn load_missing_file_leaves_store_empty() {
    let dir = TempDir::new().unwrap();
    let mut store = store();
    store.upsert(Path::new("/docs/a.txt"), "stale");

    store.load(&dir.path().join("nope.bin"));
    assert!(store.is_empty());
}

#[test]
fn load_corrupt_file_leaves_store_empty() {
    let dir = TempDir::new().unwrap();
    let state_file = dir.path().join("clusters.bin");
    std::fs::write(&state_file, b"definitely not bincode").unwrap();

    let mut store = store();
    store.load(&state_file);
    assert!(store.is_empty());
}
