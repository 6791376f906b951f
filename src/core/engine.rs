// End-to-end clustering pipeline: validate, cluster, analyze, recommend

use crate::core::analyzer::analyze_clusters;
use crate::core::error::ClusterError;
use crate::core::hierarchical::{HierarchicalClusterer, Linkage};
use crate::core::kmeans::{InitMethod, KMeansClusterer};
use crate::core::recommend::generate_recommendations;
use crate::core::types::{ClusteringMetrics, ClusteringOutput, ClusteringResult, DataPoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::info;

/// Clustering algorithm choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Kmeans,
    Hierarchical,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Kmeans => write!(f, "kmeans"),
            Algorithm::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

fn default_auto_optimize_k() -> bool {
    true
}

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_max_clusters() -> usize {
    5
}

/// A clustering request as submitted by a caller. Serde defaults keep a bare
/// `{"algorithm": ...}` request usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    pub algorithm: Algorithm,
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default = "default_auto_optimize_k")]
    pub auto_optimize_k: bool,
    /// Lloyd iteration cap, expected in [10, 1000]
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Convergence tolerance, expected in [1e-6, 1e-2]
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,
    #[serde(default)]
    pub linkage: Linkage,
    /// Fixed RNG seed for reproducible k-means runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ClusterRequest {
    fn default() -> Self {
        ClusterRequest {
            algorithm: Algorithm::Kmeans,
            k: None,
            auto_optimize_k: true,
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            max_clusters: default_max_clusters(),
            linkage: Linkage::default(),
            seed: None,
        }
    }
}

impl ClusterRequest {
    pub fn kmeans() -> Self {
        ClusterRequest::default()
    }

    pub fn hierarchical(max_clusters: usize, linkage: Linkage) -> Self {
        ClusterRequest {
            algorithm: Algorithm::Hierarchical,
            max_clusters,
            linkage,
            ..ClusterRequest::default()
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Run the full pipeline over the supplied points.
///
/// Points without a vector are dropped up front (the store can hold articles
/// that were never embedded); clustering then runs over the survivors, each
/// cluster is annotated by the text analyzer, and the result is graded into
/// recommendations. Wall-clock time for the whole call is reported in the
/// output metrics.
pub fn run_clustering(
    points: &[DataPoint],
    request: &ClusterRequest,
) -> Result<ClusteringOutput, ClusterError> {
    let start = Instant::now();

    if points.len() < 2 {
        return Err(ClusterError::InsufficientData(points.len()));
    }

    let usable: Vec<DataPoint> = points
        .iter()
        .filter(|p| !p.vector.is_empty())
        .cloned()
        .collect();
    if usable.is_empty() {
        return Err(ClusterError::NoEmbeddings);
    }
    if usable.len() < 2 {
        return Err(ClusterError::InsufficientData(usable.len()));
    }

    let result = match request.algorithm {
        Algorithm::Kmeans => run_kmeans(&usable, request)?,
        Algorithm::Hierarchical => run_hierarchical(&usable, request)?,
    };

    let clusters = analyze_clusters(&result.clusters, &usable);
    let recommendations = generate_recommendations(&clusters, result.silhouette_score);
    let elapsed = start.elapsed();

    info!(
        algorithm = %request.algorithm,
        points = usable.len(),
        clusters = clusters.len(),
        silhouette = result.silhouette_score,
        elapsed_ms = elapsed.as_millis() as u64,
        "clustering complete"
    );

    Ok(ClusteringOutput {
        algorithm: request.algorithm.to_string(),
        clusters,
        metrics: ClusteringMetrics {
            total_inertia: result.total_inertia,
            silhouette_score: result.silhouette_score,
            iterations: result.iterations,
            converged: result.converged,
            processing_time_ms: elapsed.as_millis() as u64,
        },
        recommendations,
    })
}

fn run_kmeans(
    points: &[DataPoint],
    request: &ClusterRequest,
) -> Result<ClusteringResult, ClusterError> {
    let mut clusterer = KMeansClusterer::new(request.max_iterations, request.tolerance);
    clusterer.seed = request.seed;

    let k = resolve_k(&clusterer, points, request)?;
    clusterer.cluster(points, k, InitMethod::KMeansPlusPlus)
}

/// Explicit `k` wins; otherwise auto-optimization when requested and the
/// input is large enough; otherwise `min(5, n / 2)`, floored at 2.
fn resolve_k(
    clusterer: &KMeansClusterer,
    points: &[DataPoint],
    request: &ClusterRequest,
) -> Result<usize, ClusterError> {
    if let Some(k) = request.k {
        return Ok(k);
    }

    let n = points.len();
    if request.auto_optimize_k {
        let bound = (n / 3).min(10);
        if bound >= 2 && n >= 4 {
            let optimal = clusterer.find_optimal_k(points, bound)?;
            return Ok(optimal.optimal_k);
        }
    }

    Ok((n / 2).min(5).max(2))
}

fn run_hierarchical(
    points: &[DataPoint],
    request: &ClusterRequest,
) -> Result<ClusteringResult, ClusterError> {
    // An explicit k doubles as the cut size for this path
    let max_clusters = request.k.unwrap_or(request.max_clusters);
    HierarchicalClusterer::new(max_clusters, request.linkage).cluster(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_empty_json() {
        let request: ClusterRequest = serde_json::from_str(r#"{"algorithm":"kmeans"}"#).unwrap();
        assert_eq!(request.algorithm, Algorithm::Kmeans);
        assert!(request.auto_optimize_k);
        assert_eq!(request.max_iterations, 100);
        assert_eq!(request.tolerance, 1e-4);
        assert_eq!(request.max_clusters, 5);
        assert_eq!(request.linkage, Linkage::Ward);
        assert!(request.k.is_none());
        assert!(request.seed.is_none());
    }

    #[test]
    fn test_request_parses_linkage_and_k() {
        let request: ClusterRequest = serde_json::from_str(
            r#"{"algorithm":"hierarchical","k":3,"linkage":"single"}"#,
        )
        .unwrap();
        assert_eq!(request.algorithm, Algorithm::Hierarchical);
        assert_eq!(request.k, Some(3));
        assert_eq!(request.linkage, Linkage::Single);
    }

    #[test]
    fn test_default_k_formula_without_auto_optimize() {
        let points: Vec<DataPoint> = (0..10)
            .map(|i| DataPoint::new(format!("p{}", i), vec![i as f64, 0.0]))
            .collect();
        let mut request = ClusterRequest::kmeans().with_seed(4);
        request.auto_optimize_k = false;

        let output = run_clustering(&points, &request).unwrap();
        // min(5, 10 / 2) = 5 clusters
        assert_eq!(output.clusters.len(), 5);
    }

    #[test]
    fn test_two_points_clamps_default_k() {
        let points = vec![
            DataPoint::new("a", vec![0.0, 0.0]),
            DataPoint::new("b", vec![5.0, 5.0]),
        ];
        let mut request = ClusterRequest::kmeans().with_seed(1);
        request.auto_optimize_k = false;

        let output = run_clustering(&points, &request).unwrap();
        assert_eq!(output.clusters.len(), 2);
        assert_eq!(output.metrics.total_inertia, 0.0);
    }
}
