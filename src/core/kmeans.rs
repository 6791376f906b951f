// K-means clustering with k-means++ seeding and Lloyd's refinement

use crate::core::error::ClusterError;
use crate::core::metrics::{silhouette_score, total_inertia};
use crate::core::types::{Cluster, ClusteringResult, DataPoint};
use crate::core::vector_math::{mean, pairwise_distances, squared_distance_unchecked};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Centroid seeding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitMethod {
    /// Uniform random choice of distinct input points
    #[serde(rename = "random")]
    Random,
    /// Distance-weighted spreading of seeds (k-means++)
    #[serde(rename = "kmeans++")]
    KMeansPlusPlus,
}

/// Per-candidate score recorded by `find_optimal_k`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KScore {
    pub k: usize,
    pub silhouette: f64,
    pub inertia: f64,
}

/// Result of the automatic cluster-count search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalK {
    pub optimal_k: usize,
    pub scores: Vec<KScore>,
}

/// K-means clusterer. Holds configuration only; every call constructs its
/// own iteration state, so concurrent calls never share anything mutable.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Fixed RNG seed for reproducible runs; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for KMeansClusterer {
    fn default() -> Self {
        KMeansClusterer {
            max_iterations: 100,
            tolerance: 1e-4,
            seed: None,
        }
    }
}

impl KMeansClusterer {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        KMeansClusterer {
            max_iterations,
            tolerance,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Cluster `points` into `k` groups.
    ///
    /// Fails with `InvalidK` unless `2 <= k <= points.len()` and with
    /// `DimensionMismatch` if vectors differ in length. Hitting the
    /// iteration cap is not an error; the result reports `converged: false`.
    pub fn cluster(
        &self,
        points: &[DataPoint],
        k: usize,
        init: InitMethod,
    ) -> Result<ClusteringResult, ClusterError> {
        let matrix = pairwise_distances(points)?;
        self.cluster_with_matrix(points, k, init, &matrix)
    }

    fn cluster_with_matrix(
        &self,
        points: &[DataPoint],
        k: usize,
        init: InitMethod,
        matrix: &[Vec<f64>],
    ) -> Result<ClusteringResult, ClusterError> {
        let n = points.len();
        if n < 2 {
            return Err(ClusterError::InsufficientData(n));
        }
        if k < 2 || k > n {
            return Err(ClusterError::InvalidK { k, n_points: n });
        }

        let mut rng = self.rng();
        let mut centroids = match init {
            InitMethod::Random => init_random(points, k, &mut rng),
            InitMethod::KMeansPlusPlus => init_plus_plus(points, k, &mut rng),
        };

        let mut assignments = vec![0usize; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            // Assignment over an immutable snapshot of the current centroids
            let new_assignments: Vec<usize> = points
                .iter()
                .map(|p| nearest_centroid(&p.vector, &centroids))
                .collect();

            let (new_centroids, new_assignments) =
                update_centroids(points, new_assignments, &centroids, k)?;

            let movement = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(old, new)| squared_distance_unchecked(old, new).sqrt())
                .fold(0.0f64, f64::max);

            debug!(iteration = iterations, movement, "lloyd iteration");

            centroids = new_centroids;
            assignments = new_assignments;

            if movement < self.tolerance {
                converged = true;
                break;
            }
        }

        Ok(build_result(
            points,
            &assignments,
            centroids,
            iterations,
            converged,
            matrix,
        ))
    }

    /// Run the full clustering for every candidate `k` in
    /// `[2, min(max_k, n / 2)]` and pick the one with the highest silhouette
    /// score. Candidate runs are independent and evaluated in parallel.
    pub fn find_optimal_k(
        &self,
        points: &[DataPoint],
        max_k: usize,
    ) -> Result<OptimalK, ClusterError> {
        let n = points.len();
        if n < 4 {
            return Err(ClusterError::InsufficientData(n));
        }
        let upper = max_k.min(n / 2);
        if upper < 2 {
            return Err(ClusterError::InvalidK {
                k: max_k,
                n_points: n,
            });
        }

        let matrix = pairwise_distances(points)?;
        // One base seed so parallel candidates stay reproducible under a
        // fixed configured seed
        let base_seed = self.seed.unwrap_or_else(rand::random);

        let scores = (2..=upper)
            .into_par_iter()
            .map(|k| {
                let runner = KMeansClusterer {
                    seed: Some(base_seed.wrapping_add(k as u64)),
                    ..self.clone()
                };
                let result =
                    runner.cluster_with_matrix(points, k, InitMethod::KMeansPlusPlus, &matrix)?;
                Ok(KScore {
                    k,
                    silhouette: result.silhouette_score,
                    inertia: result.total_inertia,
                })
            })
            .collect::<Result<Vec<KScore>, ClusterError>>()?;

        // First-seen maximum wins ties
        let mut best = &scores[0];
        for score in &scores[1..] {
            if score.silhouette > best.silhouette {
                best = score;
            }
        }

        debug!(optimal_k = best.k, candidates = scores.len(), "optimal k selected");
        Ok(OptimalK {
            optimal_k: best.k,
            scores,
        })
    }
}

/// Index of the nearest centroid; ties go to the lowest cluster index
fn nearest_centroid(vector: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance_unchecked(vector, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}

/// Seed centroids by picking k distinct points uniformly at random
fn init_random(points: &[DataPoint], k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    let (chosen, _) = indices.partial_shuffle(rng, k);
    chosen.iter().map(|&i| points[i].vector.clone()).collect()
}

/// Seed centroids with k-means++: first uniform, then each subsequent pick
/// weighted by squared distance to the nearest already-chosen centroid
fn init_plus_plus(points: &[DataPoint], k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
    let n = points.len();
    let first = rng.gen_range(0..n);
    let mut centroids = vec![points[first].vector.clone()];

    // Squared distance from each point to its nearest chosen centroid
    let mut weights: Vec<f64> = points
        .iter()
        .map(|p| squared_distance_unchecked(&p.vector, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = weights.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut picked = n - 1;
            for (i, &w) in weights.iter().enumerate() {
                cumulative += w;
                if cumulative >= target {
                    picked = i;
                    break;
                }
            }
            picked
        } else {
            // All points coincide with a chosen centroid; fall back to uniform
            rng.gen_range(0..n)
        };

        centroids.push(points[next].vector.clone());
        for (weight, point) in weights.iter_mut().zip(points.iter()) {
            let d = squared_distance_unchecked(&point.vector, &points[next].vector);
            if d < *weight {
                *weight = d;
            }
        }
    }

    centroids
}

/// Recompute centroids as means of their members. An empty cluster is
/// reseeded with the point farthest from its own centroid, and the donor
/// cluster's mean is recomputed so the member/centroid invariant holds.
fn update_centroids(
    points: &[DataPoint],
    mut assignments: Vec<usize>,
    previous: &[Vec<f64>],
    k: usize,
) -> Result<(Vec<Vec<f64>>, Vec<usize>), ClusterError> {
    let mut counts = vec![0usize; k];
    for &cluster in &assignments {
        counts[cluster] += 1;
    }

    let mut centroids = Vec::with_capacity(k);
    for c in 0..k {
        if counts[c] == 0 {
            // Placeholder until reseeded below
            centroids.push(previous[c].clone());
        } else {
            centroids.push(cluster_mean(points, &assignments, c)?);
        }
    }

    for c in 0..k {
        if counts[c] > 0 {
            continue;
        }
        // Reseed with the point farthest (squared distance) from its own
        // centroid, drawn from clusters that can spare a member
        let mut farthest = None;
        let mut farthest_distance = -1.0f64;
        for (i, point) in points.iter().enumerate() {
            let owner = assignments[i];
            if counts[owner] < 2 {
                continue;
            }
            let d = squared_distance_unchecked(&point.vector, &centroids[owner]);
            if d > farthest_distance {
                farthest_distance = d;
                farthest = Some(i);
            }
        }

        // With n >= 2 and k <= n some cluster always has a spare member
        let i = farthest.expect("no donor cluster found while reseeding");
        let donor = assignments[i];
        counts[donor] -= 1;
        counts[c] += 1;
        assignments[i] = c;
        centroids[c] = points[i].vector.clone();
        centroids[donor] = cluster_mean(points, &assignments, donor)?;
    }

    Ok((centroids, assignments))
}

fn cluster_mean(
    points: &[DataPoint],
    assignments: &[usize],
    cluster: usize,
) -> Result<Vec<f64>, ClusterError> {
    let members: Vec<&[f64]> = points
        .iter()
        .zip(assignments.iter())
        .filter(|(_, &a)| a == cluster)
        .map(|(p, _)| p.vector.as_slice())
        .collect();
    mean(&members)
}

fn build_result(
    points: &[DataPoint],
    assignments: &[usize],
    centroids: Vec<Vec<f64>>,
    iterations: usize,
    converged: bool,
    matrix: &[Vec<f64>],
) -> ClusteringResult {
    let k = centroids.len();
    let vectors: Vec<Vec<f64>> = points.iter().map(|p| p.vector.clone()).collect();
    let inertia = total_inertia(&vectors, assignments, &centroids);
    let silhouette = silhouette_score(assignments, k, matrix);

    let clusters = centroids
        .into_iter()
        .enumerate()
        .map(|(c, centroid)| {
            let members: Vec<String> = points
                .iter()
                .zip(assignments.iter())
                .filter(|(_, &a)| a == c)
                .map(|(p, _)| p.id.clone())
                .collect();
            let size = members.len();
            Cluster {
                id: format!("cluster-{}", c),
                centroid,
                members,
                size,
            }
        })
        .collect();

    ClusteringResult {
        clusters,
        total_inertia: inertia,
        silhouette_score: silhouette,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn two_far_groups() -> Vec<DataPoint> {
        vec![
            DataPoint::new("a", vec![0.0, 0.0]),
            DataPoint::new("b", vec![0.0, 1.0]),
            DataPoint::new("c", vec![1.0, 0.0]),
            DataPoint::new("d", vec![10.0, 10.0]),
            DataPoint::new("e", vec![10.0, 11.0]),
            DataPoint::new("f", vec![11.0, 10.0]),
        ]
    }

    fn member_sets(result: &ClusteringResult) -> Vec<HashSet<String>> {
        result
            .clusters
            .iter()
            .map(|c| c.members.iter().cloned().collect())
            .collect()
    }

    #[test]
    fn test_recovers_well_separated_groups() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default().with_seed(7);
        let result = clusterer
            .cluster(&points, 2, InitMethod::KMeansPlusPlus)
            .unwrap();

        assert!(result.converged);
        assert!(result.silhouette_score > 0.9);

        let sets = member_sets(&result);
        let left: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let right: HashSet<String> = ["d", "e", "f"].iter().map(|s| s.to_string()).collect();
        assert!(sets.contains(&left));
        assert!(sets.contains(&right));
    }

    #[test]
    fn test_partition_completeness() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default().with_seed(3);
        let result = clusterer
            .cluster(&points, 3, InitMethod::KMeansPlusPlus)
            .unwrap();

        let mut all: Vec<&String> = result
            .clusters
            .iter()
            .flat_map(|c| c.members.iter())
            .collect();
        all.sort();
        assert_eq!(all.len(), points.len());
        let unique: HashSet<&String> = all.iter().cloned().collect();
        assert_eq!(unique.len(), points.len());
    }

    #[test]
    fn test_centroid_is_member_mean() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default().with_seed(11);
        let result = clusterer
            .cluster(&points, 2, InitMethod::KMeansPlusPlus)
            .unwrap();

        for cluster in &result.clusters {
            let member_vectors: Vec<&[f64]> = points
                .iter()
                .filter(|p| cluster.members.contains(&p.id))
                .map(|p| p.vector.as_slice())
                .collect();
            let expected = mean(&member_vectors).unwrap();
            for (a, b) in cluster.centroid.iter().zip(expected.iter()) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_identical_points_reseed_empty_cluster() {
        let points: Vec<DataPoint> = (0..5)
            .map(|i| DataPoint::new(format!("p{}", i), vec![2.0, 2.0, 2.0]))
            .collect();
        let clusterer = KMeansClusterer::default().with_seed(1);
        let result = clusterer
            .cluster(&points, 2, InitMethod::KMeansPlusPlus)
            .unwrap();

        let mut sizes: Vec<usize> = result.clusters.iter().map(|c| c.size).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 4]);
        assert_eq!(result.total_inertia, 0.0);
        assert!(result.converged);
    }

    #[test]
    fn test_deterministic_with_fixed_seed() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default().with_seed(99);
        let first = clusterer
            .cluster(&points, 3, InitMethod::KMeansPlusPlus)
            .unwrap();
        let second = clusterer
            .cluster(&points, 3, InitMethod::KMeansPlusPlus)
            .unwrap();

        assert_eq!(member_sets(&first), member_sets(&second));
        assert_eq!(first.total_inertia, second.total_inertia);
        assert_eq!(first.iterations, second.iterations);
    }

    #[test]
    fn test_invalid_k() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default();
        assert!(matches!(
            clusterer.cluster(&points, 1, InitMethod::KMeansPlusPlus),
            Err(ClusterError::InvalidK { k: 1, .. })
        ));
        assert!(matches!(
            clusterer.cluster(&points, 7, InitMethod::KMeansPlusPlus),
            Err(ClusterError::InvalidK { k: 7, .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let points = vec![
            DataPoint::new("a", vec![1.0, 2.0, 3.0]),
            DataPoint::new("b", vec![1.0, 2.0, 3.0, 4.0]),
        ];
        let clusterer = KMeansClusterer::default();
        assert!(matches!(
            clusterer.cluster(&points, 2, InitMethod::KMeansPlusPlus),
            Err(ClusterError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_random_init_also_partitions() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default().with_seed(5);
        let result = clusterer.cluster(&points, 2, InitMethod::Random).unwrap();
        let total: usize = result.clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, 6);
        assert!((-1.0..=1.0).contains(&result.silhouette_score));
    }

    #[test]
    fn test_find_optimal_k_bounds_and_scores() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default().with_seed(42);
        let optimal = clusterer.find_optimal_k(&points, 5).unwrap();

        // Candidates are [2, min(5, 6/2)] = [2, 3]
        assert_eq!(optimal.scores.len(), 2);
        assert!(optimal.optimal_k >= 2 && optimal.optimal_k <= 5);
        // Two clean groups: k = 2 must win on silhouette
        assert_eq!(optimal.optimal_k, 2);
        for score in &optimal.scores {
            assert!((-1.0..=1.0).contains(&score.silhouette));
            assert!(score.inertia >= 0.0);
        }
    }

    #[test]
    fn test_find_optimal_k_deterministic() {
        let points = two_far_groups();
        let clusterer = KMeansClusterer::default().with_seed(8);
        let first = clusterer.find_optimal_k(&points, 3).unwrap();
        let second = clusterer.find_optimal_k(&points, 3).unwrap();
        assert_eq!(first.optimal_k, second.optimal_k);
    }

    #[test]
    fn test_find_optimal_k_too_few_points() {
        let points = vec![
            DataPoint::new("a", vec![0.0]),
            DataPoint::new("b", vec![1.0]),
        ];
        let clusterer = KMeansClusterer::default();
        assert!(matches!(
            clusterer.find_optimal_k(&points, 5),
            Err(ClusterError::InsufficientData(2))
        ));
    }
}
