//! Nearest-centroid cluster assignment against frozen k-means centroids.

use serde::{Deserialize, Serialize};

use super::{ModelError, ShapeMismatch};

/// Pretrained k-means centroids in normalized feature space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssigner {
    centroids: Vec<Vec<f64>>,
}

impl ClusterAssigner {
    pub fn new(centroids: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        let Some(first) = centroids.first() else {
            return Err(ModelError::Inconsistent("cluster model has no centroids".to_string()));
        };
        let dim = first.len();
        if dim == 0 {
            return Err(ModelError::Inconsistent("centroids have zero dimensions".to_string()));
        }
        if let Some((i, c)) = centroids.iter().enumerate().find(|(_, c)| c.len() != dim) {
            return Err(ModelError::Inconsistent(format!(
                "centroid {i} has {} dimensions, expected {dim}",
                c.len()
            )));
        }
        if centroids.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ModelError::Inconsistent("centroids must be finite".to_string()));
        }
        Ok(Self { centroids })
    }

    /// Dimensionality of the centroid space.
    pub fn dim(&self) -> usize {
        self.centroids[0].len()
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    /// Index of the nearest centroid. Ties go to the lowest index.
    pub fn assign(&self, point: &[f64]) -> Result<usize, ShapeMismatch> {
        if point.len() != self.dim() {
            return Err(ShapeMismatch {
                expected: self.dim(),
                actual: point.len(),
            });
        }

        let mut best_k = 0usize;
        let mut best_dist = f64::MAX;
        for (i, centroid) in self.centroids.iter().enumerate() {
            let dist = sq_dist(point, centroid);
            if dist < best_dist {
                best_dist = dist;
                best_k = i;
            }
        }
        Ok(best_k)
    }

    /// Assign every row of a normalized matrix.
    pub fn assign_all<R: AsRef<[f64]>>(&self, matrix: &[R]) -> Result<Vec<usize>, ShapeMismatch> {
        matrix.iter().map(|row| self.assign(row.as_ref())).collect()
    }
}

/// Squared Euclidean distance.
fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_assigner() -> ClusterAssigner {
        ClusterAssigner::new(vec![
            vec![10.0, 0.0, 0.0],
            vec![0.0, 10.0, 0.0],
            vec![0.0, 0.0, 10.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_assignment_to_nearest() {
        let a = axis_assigner();
        assert_eq!(a.assign(&[9.0, 1.0, 0.0]).unwrap(), 0);
        assert_eq!(a.assign(&[0.1, 9.9, 0.1]).unwrap(), 1);
        assert_eq!(a.assign(&[0.0, 0.1, 9.8]).unwrap(), 2);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let a = axis_assigner();
        assert_eq!(a.assign(&[5.0, 5.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn test_deterministic_repeated_calls() {
        let a = axis_assigner();
        let p = [3.3, 4.1, 2.9];
        let first = a.assign(&p).unwrap();
        for _ in 0..50 {
            assert_eq!(a.assign(&p).unwrap(), first);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = axis_assigner();
        assert!(a.assign(&[1.0, 2.0]).is_err());
        assert!(a.assign_all(&[vec![1.0, 2.0, 3.0], vec![1.0]]).is_err());
    }

    #[test]
    fn test_ragged_centroids_rejected() {
        assert!(ClusterAssigner::new(vec![vec![1.0, 2.0], vec![1.0]]).is_err());
        assert!(ClusterAssigner::new(vec![]).is_err());
    }
}
