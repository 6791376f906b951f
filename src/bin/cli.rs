// CLI tool for content clustering operations
// Uses shared core functionality from the content_clusterer library

use clap::{Parser, Subcommand};
use content_clusterer::{
    analyze_sentiment, extract_key_phrases, extract_topics, run_clustering, Algorithm,
    ClusterRequest, DataPoint, KMeansClusterer, Linkage,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cluster-cli")]
#[command(version = "0.1.0")]
#[command(about = "Content clustering CLI tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster points from a JSON file and print the analyzed result
    Cluster {
        /// JSON file holding an array of data points (id, vector, metadata)
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long, default_value = "kmeans")]
        algorithm: String,
        /// Cluster count (k-means) or cut size (hierarchical)
        #[arg(short = 'k', long)]
        k: Option<usize>,
        /// Search for the best k by silhouette score when k is omitted
        #[arg(long)]
        auto_k: bool,
        #[arg(long, default_value = "ward")]
        linkage: String,
        #[arg(long, default_value = "5")]
        max_clusters: usize,
        #[arg(long, default_value = "100")]
        max_iterations: usize,
        #[arg(long, default_value = "1e-4")]
        tolerance: f64,
        /// Fixed RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },

    /// Search for the best cluster count by silhouette score
    OptimalK {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long, default_value = "10")]
        max_k: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        pretty: bool,
    },

    /// Run the text analyzer over all points as one body of content
    Analyze {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

fn parse_points_from_file(path: &PathBuf) -> Result<Vec<DataPoint>, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let points: Vec<DataPoint> = serde_json::from_str(&content)?;
    Ok(points)
}

fn parse_algorithm(name: &str) -> Result<Algorithm, String> {
    match name {
        "kmeans" => Ok(Algorithm::Kmeans),
        "hierarchical" => Ok(Algorithm::Hierarchical),
        other => Err(format!(
            "Unknown algorithm: '{}' (expected 'kmeans' or 'hierarchical')",
            other
        )),
    }
}

fn parse_linkage(name: &str) -> Result<Linkage, String> {
    match name {
        "single" => Ok(Linkage::Single),
        "complete" => Ok(Linkage::Complete),
        "average" => Ok(Linkage::Average),
        "ward" => Ok(Linkage::Ward),
        other => Err(format!(
            "Unknown linkage: '{}' (expected single, complete, average or ward)",
            other
        )),
    }
}

fn write_output(content: &str, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster {
            file,
            algorithm,
            k,
            auto_k,
            linkage,
            max_clusters,
            max_iterations,
            tolerance,
            seed,
            output,
            pretty,
        } => {
            let points = parse_points_from_file(&file)?;
            if points.is_empty() {
                eprintln!("No points found in input file");
                std::process::exit(1);
            }

            let request = ClusterRequest {
                algorithm: parse_algorithm(&algorithm)?,
                k,
                auto_optimize_k: auto_k,
                max_iterations,
                tolerance,
                max_clusters,
                linkage: parse_linkage(&linkage)?,
                seed,
            };

            eprintln!(
                "Clustering {} points with {}...",
                points.len(),
                request.algorithm
            );
            let result = run_clustering(&points, &request)?;
            eprintln!(
                "Done: {} clusters in {} ms",
                result.clusters.len(),
                result.metrics.processing_time_ms
            );

            write_output(&to_json(&result, pretty)?, output)?;
        }

        Commands::OptimalK {
            file,
            max_k,
            seed,
            pretty,
        } => {
            let points = parse_points_from_file(&file)?;
            let mut clusterer = KMeansClusterer::default();
            clusterer.seed = seed;

            let optimal = clusterer.find_optimal_k(&points, max_k)?;
            println!("{}", to_json(&optimal, pretty)?);
        }

        Commands::Analyze { file, pretty } => {
            let points = parse_points_from_file(&file)?;
            let content = points
                .iter()
                .map(|p| p.metadata.content.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let result = serde_json::json!({
                "topics": extract_topics(&content),
                "sentiment": analyze_sentiment(&content),
                "keyPhrases": extract_key_phrases(&content),
            });
            println!("{}", to_json(&result, pretty)?);
        }
    }

    Ok(())
}
