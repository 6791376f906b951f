// Common record types shared across the crate
//
// Field names (via serde renames) are a compatibility surface: downstream
// consumers read `totalInertia`, `silhouetteScore`, `keyPhrases`,
// `processingTime` and so on.

use serde::{Deserialize, Serialize};

/// Article fields carried alongside each embedding vector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// A single input point: id, embedding vector, article metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: String,
    pub vector: Vec<f64>,
    #[serde(default)]
    pub metadata: ArticleMetadata,
}

impl DataPoint {
    pub fn new(id: impl Into<String>, vector: Vec<f64>) -> Self {
        DataPoint {
            id: id.into(),
            vector,
            metadata: ArticleMetadata::default(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.metadata.content = content.into();
        self
    }

    pub fn with_metadata(mut self, metadata: ArticleMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A cluster produced by either algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster ID, `cluster-{index}`
    pub id: String,
    /// Componentwise mean of member vectors
    pub centroid: Vec<f64>,
    /// Member point ids, in input order
    pub members: Vec<String>,
    /// Number of members
    pub size: usize,
}

/// Result of a clustering run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringResult {
    pub clusters: Vec<Cluster>,
    /// Sum over clusters of squared member-to-centroid distances
    pub total_inertia: f64,
    /// Mean silhouette in [-1, 1], or 0 when not computed
    pub silhouette_score: f64,
    /// Number of refinement iterations run
    pub iterations: usize,
    /// Whether the run stopped by convergence rather than the iteration cap
    pub converged: bool,
}

/// Share of sentiment-bearing words, summing to 1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

/// Lexicon sentiment over a cluster's member text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    /// (positive - negative) / (positive + negative), or 0 with no hits
    pub average: f64,
    pub distribution: SentimentDistribution,
}

/// A cluster annotated with derived text analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedCluster {
    pub id: String,
    pub centroid: Vec<f64>,
    pub members: Vec<String>,
    pub size: usize,
    pub topics: Vec<String>,
    pub sentiment: Sentiment,
    pub key_phrases: Vec<String>,
}

/// An actionable grading of the clustering outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub confidence: f64,
}

impl Recommendation {
    pub fn new(kind: &str, description: &str, confidence: f64) -> Self {
        Recommendation {
            kind: kind.to_string(),
            description: description.to_string(),
            confidence,
        }
    }
}

/// Run-level metrics reported with every output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringMetrics {
    pub total_inertia: f64,
    pub silhouette_score: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Wall-clock milliseconds for the whole pipeline
    #[serde(rename = "processingTime")]
    pub processing_time_ms: u64,
}

/// Full engine output: analyzed clusters, metrics, recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringOutput {
    pub algorithm: String,
    pub clusters: Vec<AnalyzedCluster>,
    pub metrics: ClusteringMetrics,
    pub recommendations: Vec<Recommendation>,
}
