// Typed errors for the clustering core

use thiserror::Error;

/// Errors that can occur while clustering
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Insufficient data: at least 2 usable points required, got {0}")]
    InsufficientData(usize),

    #[error("No valid embeddings found in the supplied points")]
    NoEmbeddings,

    #[error("Invalid k: {k} (must be between 2 and {n_points})")]
    InvalidK { k: usize, n_points: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty input: at least one vector is required")]
    EmptyInput,
}
