// Content Clustering Engine
// Groups embedded market articles into thematic clusters and grades the result

pub mod core;

// Re-export core functionality for external use
pub use core::{
    // Errors
    ClusterError,
    // Record types
    AnalyzedCluster, ArticleMetadata, Cluster, ClusteringMetrics, ClusteringOutput,
    ClusteringResult, DataPoint, Recommendation, Sentiment, SentimentDistribution,
    // Vector primitives and quality metrics
    distance, mean, pairwise_distances, validate_dimensions,
    silhouette_score, total_inertia,
    // Clusterers
    HierarchicalClusterer, InitMethod, KMeansClusterer, KScore, Linkage, MergeEvent, OptimalK,
    // Text analysis
    analyze_clusters, analyze_sentiment, extract_key_phrases, extract_topics,
    // Recommendations
    generate_recommendations,
    // Engine
    run_clustering, Algorithm, ClusterRequest,
};
