//! Derived metrics computed at read time: life score, efficiency, risk.

use super::recommendations::{maintenance_summary, recycling_category};
use crate::config::defaults::HIGH_RISK_LIFE_SCORE;
use crate::types::{ClassifiedRecord, DerivedRecord, TelemetryRecord};

/// Remaining-life estimate: `clamp(100 - (thermal + sm/2), 0, 100)`.
///
/// Non-finite results (NaN inputs) score 0.
pub fn life_score(t: &TelemetryRecord) -> f64 {
    let raw = 100.0 - (t.thermal_score + t.avg_sm_pct / 2.0);
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

/// Compute utilization per watt, with the power denominator floored at 1.
///
/// Never negative; finite for any finite input.
pub fn efficiency_score(t: &TelemetryRecord) -> f64 {
    let power = if t.avg_power_watts.is_nan() {
        1.0
    } else {
        t.avg_power_watts.max(1.0)
    };
    let eff = t.avg_sm_pct / power;
    if eff.is_finite() {
        eff.max(0.0)
    } else {
        0.0
    }
}

pub fn is_high_risk(life_score: f64) -> bool {
    life_score < HIGH_RISK_LIFE_SCORE
}

/// Attach read-time fields to a stored record.
pub fn derive(record: &ClassifiedRecord) -> DerivedRecord {
    let life = life_score(&record.telemetry);
    DerivedRecord {
        health_class: record.predicted_class.clone(),
        life_score: life,
        maintenance: maintenance_summary(&record.telemetry),
        recycling: recycling_category(life),
        record: record.clone(),
    }
}

pub fn derive_all(records: &[ClassifiedRecord]) -> Vec<DerivedRecord> {
    records.iter().map(derive).collect()
}
