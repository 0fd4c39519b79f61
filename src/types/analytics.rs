//! Read-side analytics types: derived records, recycling categories,
//! anomaly labels and workload profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ClassifiedRecord, HealthClass};

/// End-of-life disposition derived from the life score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecyclingCategory {
    #[serde(rename = "Continue use")]
    ContinueUse,
    #[serde(rename = "Consider partial recycling")]
    PartialRecycling,
    #[serde(rename = "Recycle / retire")]
    Retire,
}

impl RecyclingCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContinueUse => "Continue use",
            Self::PartialRecycling => "Consider partial recycling",
            Self::Retire => "Recycle / retire",
        }
    }
}

impl fmt::Display for RecyclingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-view outlier label. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyLabel {
    Normal,
    Anomaly,
}

impl AnomalyLabel {
    pub const fn is_anomaly(self) -> bool {
        matches!(self, Self::Anomaly)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Anomaly => "Anomaly",
        }
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resource dominates a device's utilization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadProfile {
    #[serde(rename = "Compute-Intensive")]
    ComputeIntensive,
    #[serde(rename = "Memory-Intensive")]
    MemoryIntensive,
    Balanced,
}

impl WorkloadProfile {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComputeIntensive => "Compute-Intensive",
            Self::MemoryIntensive => "Memory-Intensive",
            Self::Balanced => "Balanced",
        }
    }

    /// Human-readable placement hint shown next to the profile.
    pub const fn recommendation(self) -> &'static str {
        match self {
            Self::ComputeIntensive => "Compute-Intensive Workloads (AI/ML, HPC)",
            Self::MemoryIntensive => "Memory-Intensive Workloads (Rendering, Video Processing)",
            Self::Balanced => "Balanced Workloads",
        }
    }
}

impl fmt::Display for WorkloadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified record with its read-time derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub record: ClassifiedRecord,
    pub health_class: HealthClass,
    /// Remaining-life estimate in [0, 100]
    pub life_score: f64,
    /// Comma-joined maintenance actions, or "None"
    pub maintenance: String,
    pub recycling: RecyclingCategory,
}

impl DerivedRecord {
    pub fn gpu_id(&self) -> &str {
        &self.record.gpu_id
    }
}
