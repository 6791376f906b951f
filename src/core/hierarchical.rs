// Agglomerative hierarchical clustering with selectable linkage

use crate::core::error::ClusterError;
use crate::core::types::{Cluster, ClusteringResult, DataPoint};
use crate::core::vector_math::{distance_unchecked, mean, pairwise_distances, squared_distance_unchecked};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::debug;

/// Inter-cluster distance rule used during merging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Minimum pairwise point distance
    Single,
    /// Maximum pairwise point distance
    Complete,
    /// Mean of all pairwise point distances
    Average,
    /// Variance-increase merge cost, centroid form
    Ward,
}

impl Default for Linkage {
    fn default() -> Self {
        Linkage::Ward
    }
}

/// One entry of the merge log; the full sequence stands in for a dendrogram
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeEvent {
    /// Arena index of the first merged cluster
    pub left: usize,
    /// Arena index of the second merged cluster
    pub right: usize,
    /// Linkage distance at which the merge happened
    pub distance: f64,
    /// Size of the merged cluster
    pub size: usize,
}

/// Candidate pair in the merge frontier. Min-heap on distance; entries
/// referring to already-merged clusters are skipped on pop.
struct PairEntry {
    distance: f64,
    a: usize,
    b: usize,
}

impl PartialEq for PairEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PairEntry {}

impl PartialOrd for PairEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PairEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; ties broken by arena indices for
        // deterministic merge order
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.a.cmp(&self.a))
            .then_with(|| other.b.cmp(&self.b))
    }
}

/// Agglomerative clusterer. Configuration only; per-call state is local.
#[derive(Debug, Clone)]
pub struct HierarchicalClusterer {
    pub max_clusters: usize,
    pub linkage: Linkage,
}

impl Default for HierarchicalClusterer {
    fn default() -> Self {
        HierarchicalClusterer {
            max_clusters: 5,
            linkage: Linkage::Ward,
        }
    }
}

impl HierarchicalClusterer {
    pub fn new(max_clusters: usize, linkage: Linkage) -> Self {
        HierarchicalClusterer {
            max_clusters,
            linkage,
        }
    }

    /// Cluster `points` by repeatedly merging the closest pair until
    /// `max_clusters` remain.
    ///
    /// The result mirrors the k-means shape: `iterations` is 1 and
    /// `converged` is true (the merge sequence terminates by construction);
    /// the silhouette score is reported as 0 for this path.
    pub fn cluster(&self, points: &[DataPoint]) -> Result<ClusteringResult, ClusterError> {
        Ok(self.cluster_detailed(points)?.0)
    }

    /// As `cluster`, also returning the merge log.
    pub fn cluster_detailed(
        &self,
        points: &[DataPoint],
    ) -> Result<(ClusteringResult, Vec<MergeEvent>), ClusterError> {
        let n = points.len();
        if n < 2 {
            return Err(ClusterError::InsufficientData(n));
        }
        let matrix = pairwise_distances(points)?;
        let target = self.max_clusters.clamp(1, n);

        // Cluster arena: indices 0..n are singletons, merged clusters are
        // appended. Only `active` entries participate in merging.
        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        let mut centroids: Vec<Vec<f64>> = points.iter().map(|p| p.vector.clone()).collect();
        let mut active: Vec<bool> = vec![true; n];
        let mut active_count = n;

        let mut distances: HashMap<(usize, usize), f64> = HashMap::new();
        let mut heap: BinaryHeap<PairEntry> = BinaryHeap::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let d = match self.linkage {
                    // Between singletons ward reduces to d / sqrt(2)
                    Linkage::Ward => matrix[i][j] / 2.0f64.sqrt(),
                    _ => matrix[i][j],
                };
                distances.insert((i, j), d);
                heap.push(PairEntry { distance: d, a: i, b: j });
            }
        }

        let mut merges = Vec::new();
        while active_count > target {
            let entry = match heap.pop() {
                Some(entry) => entry,
                None => break,
            };
            if !active[entry.a] || !active[entry.b] {
                continue;
            }

            let (a, b) = (entry.a, entry.b);
            let merged_id = members.len();
            active[a] = false;
            active[b] = false;

            let size_a = members[a].len();
            let size_b = members[b].len();
            let mut merged_members = members[a].clone();
            merged_members.extend_from_slice(&members[b]);
            let merged_size = merged_members.len();

            // Size-weighted centroid of the merged cluster
            let centroid: Vec<f64> = centroids[a]
                .iter()
                .zip(centroids[b].iter())
                .map(|(x, y)| (x * size_a as f64 + y * size_b as f64) / merged_size as f64)
                .collect();

            merges.push(MergeEvent {
                left: a,
                right: b,
                distance: entry.distance,
                size: merged_size,
            });

            members.push(merged_members);
            centroids.push(centroid);
            active.push(true);
            active_count -= 1;

            // Distances between untouched clusters are unchanged; only the
            // merged cluster needs fresh entries (Lance-Williams updates for
            // the point-pair linkages, centroid form for ward)
            for other in 0..merged_id {
                if !active[other] {
                    continue;
                }
                let d_a = distances[&pair_key(a, other)];
                let d_b = distances[&pair_key(b, other)];
                let other_size = members[other].len();
                let d = match self.linkage {
                    Linkage::Single => d_a.min(d_b),
                    Linkage::Complete => d_a.max(d_b),
                    Linkage::Average => {
                        let wa = size_a as f64;
                        let wb = size_b as f64;
                        (wa * d_a + wb * d_b) / (wa + wb)
                    }
                    Linkage::Ward => {
                        let n1 = merged_size as f64;
                        let n2 = other_size as f64;
                        let centroid_gap =
                            distance_unchecked(&centroids[merged_id], &centroids[other]);
                        (n1 * n2 / (n1 + n2)).sqrt() * centroid_gap
                    }
                };
                distances.insert(pair_key(merged_id, other), d);
                heap.push(PairEntry {
                    distance: d,
                    a: other.min(merged_id),
                    b: other.max(merged_id),
                });
            }
        }

        debug!(
            clusters = active_count,
            merges = merges.len(),
            linkage = ?self.linkage,
            "hierarchical cut reached"
        );

        let result = build_cut(points, &members, &active)?;
        Ok((result, merges))
    }
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Materialize the final cut: centroids and inertia are derived post hoc so
/// the output matches the k-means result shape.
fn build_cut(
    points: &[DataPoint],
    members: &[Vec<usize>],
    active: &[bool],
) -> Result<ClusteringResult, ClusterError> {
    let mut clusters = Vec::new();
    let mut total_inertia = 0.0;

    for (arena_id, member_indices) in members.iter().enumerate() {
        if !active[arena_id] {
            continue;
        }
        let mut sorted = member_indices.clone();
        sorted.sort_unstable();

        let vectors: Vec<&[f64]> = sorted.iter().map(|&i| points[i].vector.as_slice()).collect();
        let centroid = mean(&vectors)?;
        let inertia: f64 = vectors
            .iter()
            .map(|v| squared_distance_unchecked(v, &centroid))
            .sum();
        total_inertia += inertia;

        let index = clusters.len();
        clusters.push(Cluster {
            id: format!("cluster-{}", index),
            centroid,
            members: sorted.iter().map(|&i| points[i].id.clone()).collect(),
            size: sorted.len(),
        });
    }

    Ok(ClusteringResult {
        clusters,
        total_inertia,
        // Relationship discovery path: partition quality is not scored here
        silhouette_score: 0.0,
        iterations: 1,
        converged: true,
    })
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
    fn test_single_linkage_recovers_groups() {
        let points = two_far_groups();
        let clusterer = HierarchicalClusterer::new(2, Linkage::Single);
        let result = clusterer.cluster(&points).unwrap();

        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.iterations, 1);
        assert!(result.converged);
        assert_eq!(result.silhouette_score, 0.0);

        let sets = member_sets(&result);
        let left: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let right: HashSet<String> = ["d", "e", "f"].iter().map(|s| s.to_string()).collect();
        assert!(sets.contains(&left));
        assert!(sets.contains(&right));
    }

    #[test]
    fn test_all_linkages_cut_to_requested_count() {
        let points = two_far_groups();
        for linkage in [
            Linkage::Single,
            Linkage::Complete,
            Linkage::Average,
            Linkage::Ward,
        ] {
            let result = HierarchicalClusterer::new(3, linkage)
                .cluster(&points)
                .unwrap();
            assert_eq!(result.clusters.len(), 3, "linkage {:?}", linkage);

            let total: usize = result.clusters.iter().map(|c| c.size).sum();
            assert_eq!(total, points.len());
        }
    }

    #[test]
    fn test_max_clusters_exceeding_point_count() {
        let points = two_far_groups();
        let result = HierarchicalClusterer::new(10, Linkage::Average)
            .cluster(&points)
            .unwrap();
        // No merging possible beyond the starting singletons
        assert_eq!(result.clusters.len(), 6);
        assert_eq!(result.total_inertia, 0.0);
    }

    #[test]
    fn test_cut_to_one_cluster() {
        let points = two_far_groups();
        let result = HierarchicalClusterer::new(1, Linkage::Ward)
            .cluster(&points)
            .unwrap();
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].size, 6);
    }

    #[test]
    fn test_merge_log_is_ordered_and_sized() {
        let points = two_far_groups();
        let (result, merges) = HierarchicalClusterer::new(2, Linkage::Single)
            .cluster_detailed(&points)
            .unwrap();

        assert_eq!(result.clusters.len(), 2);
        // 6 singletons down to 2 clusters takes exactly 4 merges
        assert_eq!(merges.len(), 4);
        for merge in &merges {
            assert!(merge.size >= 2);
            assert!(merge.distance >= 0.0);
        }
        // Single linkage merges the tight pairs before crossing the gap
        assert!(merges[0].distance <= merges[merges.len() - 1].distance);
    }

    #[test]
    fn test_centroid_matches_member_mean() {
        let points = two_far_groups();
        let result = HierarchicalClusterer::new(2, Linkage::Complete)
            .cluster(&points)
            .unwrap();

        for cluster in &result.clusters {
            let vectors: Vec<&[f64]> = points
                .iter()
                .filter(|p| cluster.members.contains(&p.id))
                .map(|p| p.vector.as_slice())
                .collect();
            let expected = mean(&vectors).unwrap();
            for (a, b) in cluster.centroid.iter().zip(expected.iter()) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_insufficient_points() {
        let points = vec![DataPoint::new("a", vec![1.0])];
        let clusterer = HierarchicalClusterer::default();
        assert!(matches!(
            clusterer.cluster(&points),
            Err(ClusterError::InsufficientData(1))
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let points = vec![
            DataPoint::new("a", vec![1.0, 2.0, 3.0]),
            DataPoint::new("b", vec![1.0, 2.0, 3.0, 4.0]),
        ];
        let clusterer = HierarchicalClusterer::default();
        assert!(matches!(
            clusterer.cluster(&points),
            Err(ClusterError::DimensionMismatch { .. })
        ));
    }
}
