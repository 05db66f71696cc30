//! Embedding gateway for TopicFS
//!
//! The numeric embedding function is an external collaborator: the
//! engine only depends on the [`TextEmbedder`] trait, which turns text
//! into a fixed-length vector. A model-backed embedder (ONNX MiniLM,
//! a remote API) plugs in behind the same trait; the built-in
//! [`HashingEmbedder`] is a deterministic, dependency-free stand-in
//! that keeps the whole pipeline functional without a model download.


use sha2::{Digest, Sha256};

/// Dimension of the embedding space. Matches the all-MiniLM-L6-v2
/// convention the rest of the ecosystem assumes.
pub const EMBEDDING_DIM: usize = 384;

/// Turns document text into a fixed-length vector.
///
/// Implementations must be infallible at this seam: un-embeddable
/// input degrades to the zero vector rather than raising, so a file
/// with no usable text can still participate in clustering as a
/// degenerate member.
pub trait TextEmbedder: Send + Sync {
    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed `text`. Blank or whitespace-only text yields the zero
    /// vector of [`Self::dimension`] length.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic feature-hashing embedder.
///
/// Tokenizes to lowercase alphanumeric runs, hashes each token into
/// one of `dimension` signed buckets and L2-normalizes the result.
/// Two documents sharing most of their vocabulary land close together
/// in Euclidean space, which is all the clustering engine needs.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        if text.trim().is_empty() {
            return vector;
        }

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(prefix) % self.dimension as u64) as usize;
            // Sign bit from an independent region of the digest so
            // colliding tokens tend to cancel instead of piling up.
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

/// Lowercase alphanumeric tokens of at least two characters
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| t.to_lowercase())
}
