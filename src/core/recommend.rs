// Rule-based grading of clustering outcomes
//
// Every rule is evaluated independently; a run can produce several
// recommendations or, for an empty result, none.

use crate::core::types::{AnalyzedCluster, Recommendation};
use std::collections::HashSet;

/// Grade a clustering result into actionable recommendations
pub fn generate_recommendations(
    clusters: &[AnalyzedCluster],
    silhouette_score: f64,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    if clusters.is_empty() {
        return recommendations;
    }

    // Quality: silhouette thresholds
    if silhouette_score > 0.7 {
        recommendations.push(Recommendation::new(
            "quality",
            "Excellent clustering quality - clusters are well-separated",
            0.9,
        ));
    } else if silhouette_score > 0.5 {
        recommendations.push(Recommendation::new(
            "quality",
            "Good clustering quality - consider fine-tuning parameters",
            0.7,
        ));
    } else {
        recommendations.push(Recommendation::new(
            "quality",
            "Poor clustering quality - try different K value or algorithm",
            0.8,
        ));
    }

    // Size: too-small average cluster
    let total_size: usize = clusters.iter().map(|c| c.size).sum();
    let average_size = total_size as f64 / clusters.len() as f64;
    if average_size < 3.0 {
        recommendations.push(Recommendation::new(
            "optimization",
            "Small clusters detected - consider reducing K or using hierarchical clustering",
            0.75,
        ));
    }

    // Diversity: distinct topics across all clusters
    let distinct_topics: HashSet<&String> =
        clusters.iter().flat_map(|c| c.topics.iter()).collect();
    if distinct_topics.len() > clusters.len() * 2 {
        recommendations.push(Recommendation::new(
            "insights",
            "High topic diversity - content spans multiple themes effectively",
            0.8,
        ));
    }

    recommendations
}
