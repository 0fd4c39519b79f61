//! Side-by-side comparison of two devices.

use serde::Serialize;

use super::derived::efficiency_score;
use crate::types::{DerivedRecord, TelemetryRecord, WorkloadProfile};

/// Field labels of a comparison table, in display order.
pub const COMPARISON_FIELDS: [&str; 8] = [
    "Health",
    "Life Score",
    "Usage Hours",
    "Avg Power (W)",
    "Peak Power (W)",
    "Avg Compute (%)",
    "Avg Memory (%)",
    "Thermal Score",
];

pub fn workload_profile(t: &TelemetryRecord) -> WorkloadProfile {
    if t.avg_sm_pct > t.avg_mem_pct {
        WorkloadProfile::ComputeIntensive
    } else if t.avg_sm_pct < t.avg_mem_pct {
        WorkloadProfile::MemoryIntensive
    } else {
        WorkloadProfile::Balanced
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub field: &'static str,
    pub a: String,
    pub b: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSide {
    pub record: DerivedRecord,
    pub efficiency: f64,
    pub workload: WorkloadProfile,
    pub workload_recommendation: &'static str,
}

impl DeviceSide {
    fn new(record: &DerivedRecord) -> Self {
        let workload = workload_profile(&record.record.telemetry);
        Self {
            efficiency: efficiency_score(&record.record.telemetry),
            workload,
            workload_recommendation: workload.recommendation(),
            record: record.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub a: DeviceSide,
    pub b: DeviceSide,
    pub rows: Vec<ComparisonRow>,
}

/// Compare two devices. Pure; distinctness is checked by the caller.
pub fn compare(a: &DerivedRecord, b: &DerivedRecord) -> Comparison {
    let ra = field_values(a);
    let rb = field_values(b);
    let rows = COMPARISON_FIELDS
        .iter()
        .zip(ra.into_iter().zip(rb))
        .map(|(&field, (a, b))| ComparisonRow { field, a, b })
        .collect();
    Comparison {
        a: DeviceSide::new(a),
        b: DeviceSide::new(b),
        rows,
    }
}

fn field_values(r: &DerivedRecord) -> [String; 8] {
    let t = &r.record.telemetry;
    [
        r.health_class.to_string(),
        format_number(r.life_score),
        format_number(t.usage_hours),
        format_number(t.avg_power_watts),
        format_number(t.peak_power_watts),
        format_number(t.avg_sm_pct),
        format_number(t.avg_mem_pct),
        format_number(t.thermal_score),
    ]
}

/// Whole numbers keep one decimal (`65.0`); others print as-is.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}
