//! Centroid-k clustering (Lloyd's k-means)
//!
//! Seeded deterministically from evenly spaced indices over the
//! caller's (path-sorted) point order, so identical inputs always
//! yield the identical partition without any RNG state.

use ndarray::Array1;

/// Partition `points` into at most `k` clusters. Returns a dense
/// cluster index per point, relabeled in order of first appearance.
pub fn kmeans_partition(points: &[Array1<f64>], k: usize, max_iterations: usize) -> Vec<usize> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }
    let k = k.clamp(1, n);

    let mut means: Vec<Array1<f64>> = (0..k).map(|c| points[c * n / k].clone()).collect();
    let mut assignment = vec![0usize; n];

    for _ in 0..max_iterations {
        let mut changed = false;
        for (idx, point) in points.iter().enumerate() {
            let mut best = 0;
            let mut best_d = f64::INFINITY;
            for (c, mean) in means.iter().enumerate() {
                let diff = point - mean;
                let d = diff.dot(&diff);
                if d < best_d {
                    best_d = d;
                    best = c;
                }
            }
            if assignment[idx] != best {
                assignment[idx] = best;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        let dim = points[0].len();
        let mut sums = vec![Array1::<f64>::zeros(dim); k];
        let mut counts = vec![0usize; k];
        for (idx, point) in points.iter().enumerate() {
            sums[assignment[idx]] += point;
            counts[assignment[idx]] += 1;
        }
        for c in 0..k {
            // A cluster emptied by duplicate seeds keeps its old mean;
            // the final relabeling compacts away unused ids.
            if counts[c] > 0 {
                means[c] = &sums[c] / counts[c] as f64;
            }
        }
    }

    relabel_dense(&assignment)
}

/// Map arbitrary cluster ids to 0..c in order of first appearance
fn relabel_dense(assignment: &[usize]) -> Vec<usize> {
    let mut mapping: Vec<Option<usize>> = vec![None; assignment.len() + 1];
    let mut next = 0;
    assignment
        .iter()
        .map(|&c| {
            *mapping[c].get_or_insert_with(|| {
                let label = next;
                next += 1;
                label
            })
        })
        .collect()
}
