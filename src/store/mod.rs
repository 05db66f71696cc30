//! Embedding store
//!
//! Owns the per-file records: extracted text and embedding vector,
//! keyed by absolute path. Clustering reads these maps; nothing else
//! mutates them. The store also implements the logical
//! `{embeddings, contents}` persistence pair. Labels and names are
//! never persisted, they are rederived by reclustering after a load.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::TextEmbedder;

/// Errors raised by store persistence
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State serialization failed: {reason}")]
    SerializationFailed { reason: String },
}

/// Persisted engine state: the embeddings/contents pair keyed by path
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    embeddings: BTreeMap<PathBuf, Vec<f32>>,
    contents: BTreeMap<PathBuf, String>,
}

/// In-memory store of file records.
///
/// Paths iterate in sorted order (BTreeMap), which keeps downstream
/// clustering deterministic for a fixed set of files.
pub struct EmbeddingStore {
    embedder: Arc<dyn TextEmbedder>,
    embeddings: BTreeMap<PathBuf, Vec<f32>>,
    contents: BTreeMap<PathBuf, String>,
}

impl EmbeddingStore {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self {
            embedder,
            embeddings: BTreeMap::new(),
            contents: BTreeMap::new(),
        }
    }

    /// Create or overwrite the record for `path` and return its
    /// embedding. Blank text records a well-defined zero vector, and
    /// an embedder that degrades (wrong-length output) is coerced to
    /// the zero vector too, so an un-embeddable file still
    /// participates in clustering instead of raising.
    pub fn upsert(&mut self, path: &Path, text: &str) -> Vec<f32> {
        let mut embedding = self.embedder.embed(text);
        if embedding.len() != self.embedder.dimension() {
            tracing::warn!(
                path = %path.display(),
                got = embedding.len(),
                expected = self.embedder.dimension(),
                "embedder returned wrong dimension, recording zero vector"
            );
            embedding = vec![0.0; self.embedder.dimension()];
        }

        self.embeddings.insert(path.to_path_buf(), embedding.clone());
        self.contents.insert(path.to_path_buf(), text.to_string());
        embedding
    }

    /// Remove the record for `path`, if any
    pub fn remove(&mut self, path: &Path) {
        self.embeddings.remove(path);
        self.contents.remove(path);
    }

    /// Re-key a record after its file moved on disk. Content and
    /// embedding are unchanged, so no re-embedding happens.
    pub fn rename(&mut self, from: &Path, to: &Path) {
        if let Some(embedding) = self.embeddings.remove(from) {
            self.embeddings.insert(to.to_path_buf(), embedding);
        }
        if let Some(text) = self.contents.remove(from) {
            self.contents.insert(to.to_path_buf(), text);
        }
    }

    /// Drop every record; no-op when already empty
    pub fn clear(&mut self) {
        self.embeddings.clear();
        self.contents.clear();
    }

    /// Read-only view of all (path, embedding) pairs
    pub fn embeddings(&self) -> &BTreeMap<PathBuf, Vec<f32>> {
        &self.embeddings
    }

    /// Read-only view of all (path, text) pairs
    pub fn contents(&self) -> &BTreeMap<PathBuf, String> {
        &self.contents
    }

    pub fn content_of(&self, path: &Path) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }

    pub fn embedding_of(&self, path: &Path) -> Option<&[f32]> {
        self.embeddings.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Persist the `{embeddings, contents}` pair to `path`
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let state = PersistedState {
            embeddings: self.embeddings.clone(),
            contents: self.contents.clone(),
        };
        let bytes =
            bincode::serialize(&state).map_err(|e| StoreError::SerializationFailed {
                reason: e.to_string(),
            })?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a persisted pair from `path` into this store, replacing
    /// its records. A missing or corrupt state file leaves the store
    /// empty; startup never fails on bad persisted state.
    pub fn load(&mut self, path: &Path) {
        self.clear();

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read state file");
                return;
            }
        };

        match bincode::deserialize::<PersistedState>(&bytes) {
            Ok(state) => {
                self.embeddings = state.embeddings;
                self.contents = state.contents;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt state file, starting empty");
            }
        }
    }
}
