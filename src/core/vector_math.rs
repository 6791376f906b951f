// Distance and centroid primitives shared by both clusterers

use crate::core::error::ClusterError;
use crate::core::types::DataPoint;
use rayon::prelude::*;

/// Compute Euclidean distance between two equal-length vectors
pub fn distance(a: &[f64], b: &[f64]) -> Result<f64, ClusterError> {
    if a.len() != b.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(distance_unchecked(a, b))
}

/// Euclidean distance; callers guarantee equal lengths
pub(crate) fn distance_unchecked(a: &[f64], b: &[f64]) -> f64 {
    squared_distance_unchecked(a, b).sqrt()
}

/// Squared Euclidean distance; callers guarantee equal lengths
pub(crate) fn squared_distance_unchecked(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Componentwise arithmetic mean of a set of equal-length vectors
pub fn mean(vectors: &[&[f64]]) -> Result<Vec<f64>, ClusterError> {
    let first = vectors.first().ok_or(ClusterError::EmptyInput)?;
    let dim = first.len();

    let mut sums = vec![0.0f64; dim];
    for vector in vectors {
        if vector.len() != dim {
            return Err(ClusterError::DimensionMismatch {
                expected: dim,
                actual: vector.len(),
            });
        }
        for (sum, value) in sums.iter_mut().zip(vector.iter()) {
            *sum += value;
        }
    }

    let count = vectors.len() as f64;
    for sum in sums.iter_mut() {
        *sum /= count;
    }
    Ok(sums)
}

/// Check that every point carries a non-empty vector of the same dimension,
/// returning that dimension
pub fn validate_dimensions(points: &[DataPoint]) -> Result<usize, ClusterError> {
    let first = points.first().ok_or(ClusterError::EmptyInput)?;
    let dim = first.vector.len();
    if dim == 0 {
        return Err(ClusterError::NoEmbeddings);
    }
    for point in points {
        if point.vector.len() != dim {
            return Err(ClusterError::DimensionMismatch {
                expected: dim,
                actual: point.vector.len(),
            });
        }
    }
    Ok(dim)
}

/// Compute the symmetric N x N Euclidean distance matrix for a set of points.
///
/// Built once and reused by hierarchical clustering and silhouette scoring.
/// Rows are independent, so they are computed in parallel; symmetry falls out
/// of computing each row in full.
pub fn pairwise_distances(points: &[DataPoint]) -> Result<Vec<Vec<f64>>, ClusterError> {
    validate_dimensions(points)?;

    let matrix = points
        .par_iter()
        .map(|p| {
            points
                .iter()
                .map(|q| distance_unchecked(&p.vector, &q.vector))
                .collect()
        })
        .collect();

    Ok(matrix)
}
