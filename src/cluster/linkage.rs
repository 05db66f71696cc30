//! Ward-linkage agglomerative clustering
//!
//! Bottom-up merging over squared Euclidean distances with the
//! Lance–Williams update for Ward's criterion. Instead of cutting a
//! completed dendrogram, merging simply stops once the cheapest merge
//! exceeds the threshold, since Ward linkage distances are monotonically
//! non-decreasing, so the resulting partition is identical to a cut.
//!
//! Quadratic memory and cubic time, which is fine for the corpus
//! sizes this engine serves (tens to low hundreds of files).

use ndarray::Array1;

/// Partition `points` by Ward linkage, stopping at `threshold`
/// (expressed as a Euclidean linkage distance). Returns a dense
/// cluster index per point, ordered by each cluster's first member.
pub fn ward_partition(points: &[Array1<f64>], threshold: f64) -> Vec<usize> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0];
    }

    // Pairwise squared distances, flat n x n
    let mut d2 = vec![0.0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = &points[i] - &points[j];
            let d = diff.dot(&diff);
            d2[i * n + j] = d;
            d2[j * n + i] = d;
        }
    }

    let mut active = vec![true; n];
    let mut size = vec![1usize; n];
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    loop {
        // Cheapest merge among active clusters; strict < keeps ties
        // resolved by lowest index pair, which keeps runs reproducible
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                let d = d2[i * n + j];
                if best.map_or(true, |(_, _, bd)| d < bd) {
                    best = Some((i, j, d));
                }
            }
        }

        let Some((i, j, d)) = best else {
            break;
        };
        if d.sqrt() > threshold {
            break;
        }

        // Lance–Williams for Ward, using sizes before the merge:
        // d2(ij,k) = ((si+sk) d2(i,k) + (sj+sk) d2(j,k) - sk d2(i,j))
        //            / (si + sj + sk)
        let (si, sj) = (size[i] as f64, size[j] as f64);
        for k in 0..n {
            if !active[k] || k == i || k == j {
                continue;
            }
            let sk = size[k] as f64;
            let updated =
                ((si + sk) * d2[i * n + k] + (sj + sk) * d2[j * n + k] - sk * d) / (si + sj + sk);
            d2[i * n + k] = updated;
            d2[k * n + i] = updated;
        }

        size[i] += size[j];
        active[j] = false;
        let absorbed = std::mem::take(&mut members[j]);
        members[i].extend(absorbed);
    }

    // Merging always folds the higher index into the lower, so
    // iterating survivors in index order yields clusters ordered by
    // their smallest original member.
    let mut labels = vec![0usize; n];
    let mut next = 0;
    for i in 0..n {
        if active[i] {
            for &m in &members[i] {
                labels[m] = next;
            }
            next += 1;
        }
    }
    labels
}
