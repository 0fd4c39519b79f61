//! Cohort-level aggregates and the numeric correlation matrix.
//!
//! Every function here accepts an empty cohort and returns a neutral value.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeMap;

use super::derived::is_high_risk;
use crate::types::{DerivedRecord, FEATURE_COLUMNS, NUM_FEATURES};

/// Mean utilization across a cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StressProfile {
    pub avg_power_watts: f64,
    pub avg_sm_pct: f64,
    pub avg_mem_pct: f64,
    pub usage_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub total_devices: usize,
    pub avg_life_score: f64,
    /// "N/A" for an empty cohort.
    pub most_common_class: String,
    pub high_risk_units: usize,
    pub stress: StressProfile,
    pub distribution: BTreeMap<String, usize>,
}

impl CohortSummary {
    pub fn from_records(records: &[DerivedRecord]) -> Self {
        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
        for r in records {
            *distribution.entry(r.health_class.to_string()).or_default() += 1;
        }

        // BTreeMap iterates alphabetically; keep the first maximum.
        let most_common_class = distribution
            .iter()
            .fold(None::<(&String, usize)>, |best, (class, &count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((class, count)),
            })
            .map_or_else(|| "N/A".to_string(), |(class, _)| class.clone());

        let stress = StressProfile {
            avg_power_watts: mean(records.iter().map(|r| r.record.telemetry.avg_power_watts)),
            avg_sm_pct: mean(records.iter().map(|r| r.record.telemetry.avg_sm_pct)),
            avg_mem_pct: mean(records.iter().map(|r| r.record.telemetry.avg_mem_pct)),
            usage_hours: mean(records.iter().map(|r| r.record.telemetry.usage_hours)),
        };

        Self {
            total_devices: records.len(),
            avg_life_score: mean(records.iter().map(|r| r.life_score)),
            most_common_class,
            high_risk_units: records.iter().filter(|r| is_high_risk(r.life_score)).count(),
            stress,
            distribution,
        }
    }
}

/// Restrict a cohort to the given device ids; an empty selection keeps all.
pub fn select_devices(records: &[DerivedRecord], gpu_ids: &[String]) -> Vec<DerivedRecord> {
    if gpu_ids.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| gpu_ids.iter().any(|id| id == r.gpu_id()))
        .cloned()
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Column labels of the correlation matrix: telemetry features then life score.
pub const CORRELATION_FIELDS: [&str; NUM_FEATURES + 1] = [
    FEATURE_COLUMNS[0],
    FEATURE_COLUMNS[1],
    FEATURE_COLUMNS[2],
    FEATURE_COLUMNS[3],
    FEATURE_COLUMNS[4],
    FEATURE_COLUMNS[5],
    FEATURE_COLUMNS[6],
    "life_score",
];

/// Pairwise Pearson coefficients with two-tailed p-values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<&'static str>,
    pub r: Vec<Vec<f64>>,
    pub p_values: Vec<Vec<f64>>,
    pub sample_count: usize,
}

impl CorrelationMatrix {
    pub fn from_records(records: &[DerivedRecord]) -> Self {
        let columns: Vec<Vec<f64>> = (0..CORRELATION_FIELDS.len())
            .map(|c| {
                records
                    .iter()
                    .map(|r| {
                        if c < NUM_FEATURES {
                            r.record.telemetry.features()[c]
                        } else {
                            r.life_score
                        }
                    })
                    .collect()
            })
            .collect();

        let k = columns.len();
        let n = records.len();
        let mut r = vec![vec![0.0; k]; k];
        let mut p_values = vec![vec![1.0; k]; k];
        for i in 0..k {
            r[i][i] = 1.0;
            p_values[i][i] = 0.0;
            for j in (i + 1)..k {
                let coef = pearson(&columns[i], &columns[j]);
                let p = p_value_for_r(coef, n);
                r[i][j] = coef;
                r[j][i] = coef;
                p_values[i][j] = p;
                p_values[j][i] = p;
            }
        }

        Self {
            fields: CORRELATION_FIELDS.to_vec(),
            r,
            p_values,
            sample_count: n,
        }
    }

    /// Coefficient for a named pair, if both fields exist.
    pub fn get(&self, x: &str, y: &str) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == x)?;
        let j = self.fields.iter().position(|f| *f == y)?;
        Some(self.r[i][j])
    }
}

/// `r = Σ(xi - x̄)(yi - ȳ) / sqrt(Σ(xi - x̄)² Σ(yi - ȳ)²)`; 0 when either side is constant.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if x.is_empty() || x.len() != y.len() {
        return 0.0;
    }
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|a| a * a).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator <= f64::EPSILON || !denominator.is_finite() {
        return 0.0;
    }
    let r = numerator / denominator;
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Two-tailed p-value from a t-distribution with `n - 2` degrees of freedom.
fn p_value_for_r(r: f64, n: usize) -> f64 {
    if n < 3 || !r.is_finite() {
        return 1.0;
    }
    if r.abs() >= 0.9999 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}
