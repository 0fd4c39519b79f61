//! Cohort anomaly detection with an isolation forest.
//!
//! The forest is refit on every call over the supplied cohort and thrown
//! away afterwards: `detect_anomalies` is a pure function of its inputs and
//! config. Trees are built in parallel, each from its own RNG seeded with
//! `seed + tree_index`, so results do not depend on scheduling.
//!
//! Scoring follows Liu et al. (2008): `s = 2^(-E[h(x)] / c(n))` where `c(n)`
//! is the average unsuccessful-search path length of a BST over `n` points.
//! Records whose score is strictly above the `(1 - contamination)` quantile
//! of the cohort's scores are labelled anomalous.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::defaults::{
    ANOMALY_CONTAMINATION, ANOMALY_MAX_SAMPLES, ANOMALY_MIN_COHORT, ANOMALY_N_TREES,
    ANOMALY_SEED,
};
use crate::types::{AnomalyLabel, DerivedRecord, TelemetryRecord};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation forest parameters (`[anomaly]` config section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Expected outlier fraction; sets the score threshold quantile.
    pub contamination: f64,
    pub seed: u64,
    pub n_trees: usize,
    /// Upper bound on each tree's subsample.
    pub max_samples: usize,
    /// Cohorts smaller than this are reported all Normal.
    pub min_cohort: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: ANOMALY_CONTAMINATION,
            seed: ANOMALY_SEED,
            n_trees: ANOMALY_N_TREES,
            max_samples: ANOMALY_MAX_SAMPLES,
            min_cohort: ANOMALY_MIN_COHORT,
        }
    }
}

/// Feature subset the detector looks at.
pub fn anomaly_features(t: &TelemetryRecord) -> [f64; 3] {
    [t.avg_power_watts, t.avg_sm_pct, t.avg_mem_pct]
}

/// Label each row of a cohort. Output order matches input order.
pub fn detect_anomalies(cohort: &[[f64; 3]], config: &AnomalyConfig) -> Vec<AnomalyLabel> {
    let n = cohort.len();
    if n == 0 {
        return Vec::new();
    }
    if n < config.min_cohort.max(2) || config.n_trees == 0 || !is_scorable(cohort) {
        return vec![AnomalyLabel::Normal; n];
    }

    let scores = score_cohort(cohort, config);
    let threshold = quantile(&scores, 1.0 - config.contamination);
    let labels: Vec<AnomalyLabel> = scores
        .iter()
        .map(|&s| {
            if s > threshold {
                AnomalyLabel::Anomaly
            } else {
                AnomalyLabel::Normal
            }
        })
        .collect();

    debug!(
        cohort = n,
        threshold,
        flagged = labels.iter().filter(|l| l.is_anomaly()).count(),
        "Isolation forest scored cohort"
    );
    labels
}

/// Anomaly scores in (0, 1], higher is more isolated.
pub fn score_cohort(cohort: &[[f64; 3]], config: &AnomalyConfig) -> Vec<f64> {
    let n = cohort.len();
    let sample_size = config.max_samples.max(1).min(n);
    let max_depth = (sample_size as f64).log2().ceil() as usize;

    let trees: Vec<IsolationTree> = (0..config.n_trees)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
            let sample: Vec<[f64; 3]> = rand::seq::index::sample(&mut rng, n, sample_size)
                .into_iter()
                .map(|idx| cohort[idx])
                .collect();
            IsolationTree::build(&sample, max_depth, &mut rng)
        })
        .collect();

    let c_n = average_path_length(sample_size as f64);
    cohort
        .iter()
        .map(|point| {
            let mean_depth = trees.iter().map(|t| t.path_length(point, 0)).sum::<f64>()
                / trees.len() as f64;
            if c_n > 0.0 {
                2.0_f64.powf(-mean_depth / c_n)
            } else {
                0.5
            }
        })
        .collect()
}

/// Per-device labels over a derived-record cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub labels: Vec<DeviceAnomaly>,
    pub total: usize,
    pub anomalies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceAnomaly {
    #[serde(rename = "GPU_ID")]
    pub gpu_id: String,
    #[serde(rename = "Anomaly")]
    pub label: AnomalyLabel,
}

impl AnomalyReport {
    pub fn from_records(records: &[DerivedRecord], config: &AnomalyConfig) -> Self {
        let features: Vec<[f64; 3]> = records
            .iter()
            .map(|r| anomaly_features(&r.record.telemetry))
            .collect();
        let labels: Vec<DeviceAnomaly> = records
            .iter()
            .zip(detect_anomalies(&features, config))
            .map(|(r, label)| DeviceAnomaly {
                gpu_id: r.gpu_id().to_string(),
                label,
            })
            .collect();
        let anomalies = labels.iter().filter(|d| d.label.is_anomaly()).count();
        Self {
            total: labels.len(),
            anomalies,
            labels,
        }
    }

    /// Device ids labelled anomalous, in cohort order.
    pub fn flagged_ids(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|d| d.label.is_anomaly())
            .map(|d| d.gpu_id.as_str())
            .collect()
    }
}

fn feature_range(rows: &[[f64; 3]], f: usize) -> (f64, f64) {
    rows.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), row| {
            (lo.min(row[f]), hi.max(row[f]))
        })
}

/// A split range must be non-empty and representable as an `f64` width.
fn is_splittable(min: f64, max: f64) -> bool {
    let width = max - min;
    width.is_finite() && width > f64::EPSILON
}

/// Some feature varies and no feature spans more than `f64` can hold.
fn is_scorable(cohort: &[[f64; 3]]) -> bool {
    let ranges: Vec<(f64, f64)> = (0..3).map(|f| feature_range(cohort, f)).collect();
    if ranges.iter().any(|(min, max)| !(max - min).is_finite()) {
        debug!("Feature range overflows, skipping isolation forest");
        return false;
    }
    ranges.iter().any(|&(min, max)| is_splittable(min, max))
}

/// Linear-interpolated quantile, `q` in [0, 1].
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug)]
enum IsolationTree {
    Internal {
        feature: usize,
        split: f64,
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
    External {
        size: usize,
    },
}

impl IsolationTree {
    fn build(data: &[[f64; 3]], depth_left: usize, rng: &mut StdRng) -> Self {
        if depth_left == 0 || data.len() <= 1 {
            return Self::External { size: data.len() };
        }

        // Only split on features that still vary within this node.
        let ranges: Vec<(usize, f64, f64)> = (0..3)
            .filter_map(|f| {
                let (min, max) = feature_range(data, f);
                is_splittable(min, max).then_some((f, min, max))
            })
            .collect();
        if ranges.is_empty() {
            return Self::External { size: data.len() };
        }

        let (feature, min, max) = ranges[rng.gen_range(0..ranges.len())];
        let split = rng.gen_range(min..max);
        let (left, right): (Vec<[f64; 3]>, Vec<[f64; 3]>) =
            data.iter().partition(|row| row[feature] < split);
        if left.is_empty() || right.is_empty() {
            return Self::External { size: data.len() };
        }

        Self::Internal {
            feature,
            split,
            left: Box::new(Self::build(&left, depth_left - 1, rng)),
            right: Box::new(Self::build(&right, depth_left - 1, rng)),
        }
    }

    fn path_length(&self, point: &[f64; 3], depth: usize) -> f64 {
        match self {
            Self::External { size } => depth as f64 + average_path_length(*size as f64),
            Self::Internal {
                feature,
                split,
                left,
                right,
            } => {
                if point[*feature] < *split {
                    left.path_length(point, depth + 1)
                } else {
                    right.path_length(point, depth + 1)
                }
            }
        }
    }
}

/// `c(n)`: average path length of an unsuccessful BST search.
fn average_path_length(n: f64) -> f64 {
    if n <= 1.0 {
        return 0.0;
    }
    if n <= 2.0 {
        return 1.0;
    }
    2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}
