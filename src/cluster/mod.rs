//! Clustering engine
//!
//! Consumes the store's full set of embeddings and produces a label
//! per file. Clustering is eager and whole-set: every store mutation
//! triggers a recompute. Label values are not stable identities
//! across recomputes; only the partition (which files land
//! together) is reproducible for fixed inputs.

mod kmeans;
mod linkage;
pub mod namer;


pub use kmeans::kmeans_partition;
pub use linkage::ward_partition;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1};

use crate::core::config::ClusteringConfig;

/// Maximum Lloyd iterations for centroid-k
const KMEANS_MAX_ITERATIONS: usize = 100;

/// Clustering algorithm, selectable per recompute invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Ward-linkage agglomerative clustering cut at a fixed distance
    /// threshold, so the topic count emerges from content tightness
    #[default]
    ThresholdLinkage,
    /// k-means with k = clamp(round(sqrt n), min_k, max_k), capped at n
    CentroidK,
}

impl Algorithm {
    /// Name used on the wire; kept compatible with the original client
    pub fn wire_name(&self) -> &'static str {
        match self {
            Algorithm::ThresholdLinkage => "DBSCAN",
            Algorithm::CentroidK => "KMEANS",
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DBSCAN" | "THRESHOLD-LINKAGE" | "THRESHOLD_LINKAGE" => Ok(Algorithm::ThresholdLinkage),
            "KMEANS" | "CENTROID-K" | "CENTROID_K" => Ok(Algorithm::CentroidK),
            other => Err(format!("unknown algorithm: {other}")),
        }
    }
}

/// Recompute the partition over the given records.
///
/// Label shape by record count:
/// - zero records: empty mapping
/// - one record: label `0` (a lone file is its own singleton topic,
///   never unsorted)
/// - otherwise: labels `0..c` from the selected algorithm
pub fn recompute(
    records: &BTreeMap<PathBuf, Vec<f32>>,
    algorithm: Algorithm,
    config: &ClusteringConfig,
) -> HashMap<PathBuf, i32> {
    if records.is_empty() {
        return HashMap::new();
    }

    // BTreeMap iteration order makes the point order, and with it the
    // partition, reproducible for a fixed record set.
    let paths: Vec<&PathBuf> = records.keys().collect();
    if paths.len() == 1 {
        return HashMap::from([(paths[0].clone(), 0)]);
    }

    let points: Vec<Array1<f64>> = records
        .values()
        .map(|v| Array1::from_iter(v.iter().map(|x| *x as f64)))
        .collect();

    let assignment = match algorithm {
        Algorithm::ThresholdLinkage => {
            ward_partition(&points, config.distance_threshold as f64)
        }
        Algorithm::CentroidK => {
            let n = points.len();
            let k = ((n as f64).sqrt().round() as usize)
                .clamp(config.min_k, config.max_k)
                .min(n);
            kmeans_partition(&points, k, KMEANS_MAX_ITERATIONS)
        }
    };

    paths
        .into_iter()
        .zip(assignment)
        .map(|(path, label)| (path.clone(), label as i32))
        .collect()
}

/// Element-wise mean of a set of vectors, `None` when the set is empty
pub fn centroid_of(vectors: &[&[f32]]) -> Option<Array1<f32>> {
    let first = vectors.first()?;
    let mut sum = Array1::<f32>::zeros(first.len());
    for v in vectors {
        sum += &ArrayView1::from(*v);
    }
    Some(sum / vectors.len() as f32)
}

/// Cosine similarity, 0.0 when either vector is all-zero
pub fn cosine_similarity(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let dot = a.dot(&b);
    let norms = a.dot(&a).sqrt() * b.dot(&b).sqrt();
    if norms > 0.0 {
        dot / norms
    } else {
        0.0
    }
}
