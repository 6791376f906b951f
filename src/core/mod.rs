// Core clustering functionality shared between the library surface and CLI

pub mod analyzer;
pub mod engine;
pub mod error;
pub mod hierarchical;
pub mod kmeans;
pub mod metrics;
pub mod recommend;
pub mod types;
pub mod vector_math;

// Re-export error type
pub use error::ClusterError;

// Re-export record types
pub use types::{
    AnalyzedCluster, ArticleMetadata, Cluster, ClusteringMetrics, ClusteringOutput,
    ClusteringResult, DataPoint, Recommendation, Sentiment, SentimentDistribution,
};

// Re-export vector primitives and quality metrics
pub use metrics::{silhouette_score, total_inertia};
pub use vector_math::{distance, mean, pairwise_distances, validate_dimensions};

// Re-export clusterers
pub use hierarchical::{HierarchicalClusterer, Linkage, MergeEvent};
pub use kmeans::{InitMethod, KMeansClusterer, KScore, OptimalK};

// Re-export analysis and recommendations
pub use analyzer::{
    analyze_clusters, analyze_sentiment, extract_key_phrases, extract_topics, NEGATIVE_WORDS,
    POSITIVE_WORDS,
};
pub use recommend::generate_recommendations;

// Re-export the engine surface
pub use engine::{run_clustering, Algorithm, ClusterRequest};
