// Deterministic text analysis over cluster member content
//
// Frequency heuristics, not topic modeling: cheap, dependency-free and
// reproducible for the same input.

use crate::core::types::{AnalyzedCluster, Cluster, DataPoint, Sentiment, SentimentDistribution};
use std::collections::HashMap;

/// Lexicon of positive market-sentiment words
pub const POSITIVE_WORDS: [&str; 7] = [
    "growth", "success", "profit", "increase", "positive", "good", "excellent",
];

/// Lexicon of negative market-sentiment words
pub const NEGATIVE_WORDS: [&str; 7] = [
    "decline", "loss", "negative", "bad", "crisis", "problem", "failure",
];

const TOP_COUNT: usize = 5;

/// Lowercase, strip punctuation to spaces, split on whitespace, keep tokens
/// longer than `min_len`
fn tokenize(content: &str, min_len: usize) -> Vec<String> {
    content
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| word.len() > min_len)
        .map(|word| word.to_string())
        .collect()
}

/// Top `TOP_COUNT` items by descending count; ties broken by first occurrence
fn top_by_frequency<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for item in items {
        let entry = counts.entry(item.clone()).or_insert(0);
        if *entry == 0 {
            order.push(item);
        }
        *entry += 1;
    }

    // Stable sort keeps first-occurrence order within equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(TOP_COUNT);
    order
}

/// Extract the most frequent long tokens (length > 4) as topics
pub fn extract_topics(content: &str) -> Vec<String> {
    top_by_frequency(tokenize(content, 4))
}

/// Score sentiment by counting lexicon hits over whitespace-split words
pub fn analyze_sentiment(content: &str) -> Sentiment {
    let mut positive = 0usize;
    let mut negative = 0usize;

    for word in content.to_lowercase().split_whitespace() {
        if POSITIVE_WORDS.contains(&word) {
            positive += 1;
        }
        if NEGATIVE_WORDS.contains(&word) {
            negative += 1;
        }
    }

    let total = (positive + negative) as f64;
    if total == 0.0 {
        return Sentiment {
            average: 0.0,
            distribution: SentimentDistribution {
                positive: 0.0,
                negative: 0.0,
                neutral: 1.0,
            },
        };
    }

    let positive_share = positive as f64 / total;
    let negative_share = negative as f64 / total;
    Sentiment {
        average: (positive as f64 - negative as f64) / total,
        distribution: SentimentDistribution {
            positive: positive_share,
            negative: negative_share,
            neutral: 1.0 - positive_share - negative_share,
        },
    }
}

/// Mine the most frequent bigrams and trigrams over tokens of length > 3
pub fn extract_key_phrases(content: &str) -> Vec<String> {
    let words = tokenize(content, 3);
    let mut phrases = Vec::new();

    for i in 0..words.len().saturating_sub(1) {
        phrases.push(format!("{} {}", words[i], words[i + 1]));
        if i + 2 < words.len() {
            phrases.push(format!("{} {} {}", words[i], words[i + 1], words[i + 2]));
        }
    }

    top_by_frequency(phrases)
}

/// Annotate every cluster with topics, sentiment and key phrases derived
/// from its members' concatenated content
pub fn analyze_clusters(clusters: &[Cluster], points: &[DataPoint]) -> Vec<AnalyzedCluster> {
    let by_id: HashMap<&str, &DataPoint> =
        points.iter().map(|p| (p.id.as_str(), p)).collect();

    clusters
        .iter()
        .map(|cluster| {
            let content = cluster
                .members
                .iter()
                .filter_map(|id| by_id.get(id.as_str()))
                .map(|p| p.metadata.content.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            AnalyzedCluster {
                id: cluster.id.clone(),
                centroid: cluster.centroid.clone(),
                members: cluster.members.clone(),
                size: cluster.size,
                topics: extract_topics(&content),
                sentiment: analyze_sentiment(&content),
                key_phrases: extract_key_phrases(&content),
            }
        })
        .collect()
}
