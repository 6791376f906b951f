// Clustering quality metrics shared by both algorithms

use crate::core::vector_math::squared_distance_unchecked;

/// Sum of squared distances from each point to its assigned centroid
pub fn total_inertia(
    vectors: &[Vec<f64>],
    assignments: &[usize],
    centroids: &[Vec<f64>],
) -> f64 {
    vectors
        .iter()
        .zip(assignments.iter())
        .map(|(vector, &cluster)| squared_distance_unchecked(vector, &centroids[cluster]))
        .sum()
}

/// Mean silhouette score over all points, in [-1, 1].
///
/// For each point: a = mean distance to its own cluster's other members,
/// b = smallest mean distance to any other cluster, score = (b - a) / max(a, b).
/// Points in singleton clusters score 0; fewer than two clusters scores 0.
pub fn silhouette_score(assignments: &[usize], n_clusters: usize, matrix: &[Vec<f64>]) -> f64 {
    let n = assignments.len();
    if n == 0 || n_clusters < 2 {
        return 0.0;
    }

    let mut sizes = vec![0usize; n_clusters];
    for &cluster in assignments {
        sizes[cluster] += 1;
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = assignments[i];
        if sizes[own] < 2 {
            // Silhouette is undefined for a singleton cluster
            continue;
        }

        // Mean distance to every cluster, own and others
        let mut sums = vec![0.0f64; n_clusters];
        for j in 0..n {
            if i != j {
                sums[assignments[j]] += matrix[i][j];
            }
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..n_clusters)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        if b.is_finite() {
            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }
    }

    total / n as f64
}
