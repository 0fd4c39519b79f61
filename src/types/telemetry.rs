//! Telemetry record types: raw input rows, classified rows, health classes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of raw telemetry features the cluster model is trained on.
pub const NUM_FEATURES: usize = 7;

/// Raw feature columns in model training order.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "overclock_proxy",
    "usage_hours",
    "avg_power_watts",
    "peak_power_watts",
    "avg_sm_pct",
    "avg_mem_pct",
    "thermal_score",
];

/// One row of raw accelerator telemetry.
///
/// Any column absent from the upload is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// 1 when the device runs outside its default clock/power profile
    #[serde(default)]
    pub overclock_proxy: f64,
    #[serde(default)]
    pub usage_hours: f64,
    #[serde(default)]
    pub avg_power_watts: f64,
    #[serde(default)]
    pub peak_power_watts: f64,
    /// Average streaming-multiprocessor (compute) utilization, percent
    #[serde(default)]
    pub avg_sm_pct: f64,
    /// Average memory utilization, percent
    #[serde(default)]
    pub avg_mem_pct: f64,
    #[serde(default)]
    pub thermal_score: f64,
}

impl TelemetryRecord {
    /// Feature vector in [`FEATURE_COLUMNS`] order.
    pub fn features(&self) -> [f64; NUM_FEATURES] {
        [
            self.overclock_proxy,
            self.usage_hours,
            self.avg_power_watts,
            self.peak_power_watts,
            self.avg_sm_pct,
            self.avg_mem_pct,
            self.thermal_score,
        ]
    }

    /// Build a record from a feature vector in [`FEATURE_COLUMNS`] order.
    pub fn from_features(values: &[f64; NUM_FEATURES]) -> Self {
        Self {
            overclock_proxy: values[0],
            usage_hours: values[1],
            avg_power_watts: values[2],
            peak_power_watts: values[3],
            avg_sm_pct: values[4],
            avg_mem_pct: values[5],
            thermal_score: values[6],
        }
    }

    /// Set a feature by its column index in [`FEATURE_COLUMNS`].
    pub fn set_feature(&mut self, index: usize, value: f64) {
        debug_assert!(index < NUM_FEATURES, "feature index {index} out of range");
        match index {
            0 => self.overclock_proxy = value,
            1 => self.usage_hours = value,
            2 => self.avg_power_watts = value,
            3 => self.peak_power_watts = value,
            4 => self.avg_sm_pct = value,
            5 => self.avg_mem_pct = value,
            6 => self.thermal_score = value,
            _ => {}
        }
    }

    pub fn is_overclocked(&self) -> bool {
        (self.overclock_proxy - 1.0).abs() < f64::EPSILON
    }
}

// ============================================================================
// Health Class
// ============================================================================

/// Categorical health label produced by the cluster model's label mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthClass {
    Healthy,
    Moderate,
    Critical,
    /// Assigned when a cluster has no mapping and the fallback policy allows it
    Unknown,
    /// Any other class name shipped in a label mapping
    Other(String),
}

impl HealthClass {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Healthy => "Healthy",
            Self::Moderate => "Moderate",
            Self::Critical => "Critical",
            Self::Unknown => "Unknown",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for HealthClass {
    fn from(name: String) -> Self {
        match name.trim() {
            "Healthy" => Self::Healthy,
            "Moderate" => Self::Moderate,
            "Critical" => Self::Critical,
            "Unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&str> for HealthClass {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<HealthClass> for String {
    fn from(class: HealthClass) -> Self {
        class.as_str().to_string()
    }
}

impl fmt::Display for HealthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Classified Record
// ============================================================================

/// A telemetry row after classification, as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// Device identifier; 1-based row position when the upload has no ID column
    #[serde(rename = "GPU_ID")]
    pub gpu_id: String,
    #[serde(flatten)]
    pub telemetry: TelemetryRecord,
    /// Raw cluster index from the assigner
    pub cluster: usize,
    #[serde(rename = "Predicted_Class")]
    pub predicted_class: HealthClass,
    /// Shared ISO-8601 identifier of the upload this row belongs to
    pub batch_id: String,
}
