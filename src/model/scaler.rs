//! Standard-score feature scaling with frozen, pretrained parameters.
//!
//! Each feature is independently centred and scaled with the mean and
//! standard deviation recorded at training time. Unlike an online normalizer
//! the parameters never move, so the same raw vector always maps to the same
//! normalized vector.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ModelError, ShapeMismatch};

/// Scale entries at or below this magnitude are treated as 1.0 (constant
/// feature at training time).
const MIN_SCALE: f64 = 1e-12;

/// Pretrained per-feature centre/scale parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FeatureScaler {
    /// Build a scaler, checking that `mean` and `scale` describe the same
    /// non-empty feature set.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        if mean.is_empty() {
            return Err(ModelError::Inconsistent("scaler has no features".to_string()));
        }
        if mean.len() != scale.len() {
            return Err(ModelError::Inconsistent(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::Inconsistent(
                "scaler parameters must be finite".to_string(),
            ));
        }
        Ok(Self { mean, scale })
    }

    /// Number of features the scaler was fit on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Normalize one raw feature vector.
    pub fn transform(&self, raw: &[f64]) -> Result<Vec<f64>, ShapeMismatch> {
        if raw.len() != self.n_features() {
            return Err(ShapeMismatch {
                expected: self.n_features(),
                actual: raw.len(),
            });
        }
        Ok(raw
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| {
                let scale = if scale.abs() <= MIN_SCALE { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }

    /// Normalize a batch of rows in parallel. Any row of the wrong width
    /// fails the whole batch.
    pub fn transform_batch<R>(&self, rows: &[R]) -> Result<Vec<Vec<f64>>, ShapeMismatch>
    where
        R: AsRef<[f64]> + Sync,
    {
        rows.par_iter().map(|row| self.transform(row.as_ref())).collect()
    }
}
