//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use recore::model::{ClusterAssigner, FeatureScaler, LabelMapping};
use recore::types::{HealthClass, NUM_FEATURES};
use recore::ClusterModel;
use std::collections::BTreeMap;

/// Index of `thermal_score` in the feature vector.
pub const THERMAL: usize = 6;

/// Identity-scaled model whose three centroids differ only in thermal score:
/// 5 → Healthy, 18 → Moderate, 30 → Critical.
pub fn thermal_model() -> ClusterModel {
    let centroid = |thermal: f64| {
        let mut c = vec![0.0; NUM_FEATURES];
        c[THERMAL] = thermal;
        c
    };
    ClusterModel::from_parts(
        FeatureScaler::new(vec![0.0; NUM_FEATURES], vec![1.0; NUM_FEATURES]).unwrap(),
        ClusterAssigner::new(vec![centroid(5.0), centroid(18.0), centroid(30.0)]).unwrap(),
        LabelMapping::new(BTreeMap::from([
            (0, HealthClass::Healthy),
            (1, HealthClass::Moderate),
            (2, HealthClass::Critical),
        ])),
    )
    .unwrap()
}

/// Three devices with life scores 65, 50 and 35.
pub const THREE_DEVICE_CSV: &str = "\
gpu_id,thermal_score,avg_sm_pct
1,10,50
2,20,60
3,30,70
";

/// One compute-bound and one memory-bound device.
pub const WORKLOAD_CSV: &str = "\
gpu_id,avg_sm_pct,avg_mem_pct,avg_power_watts,thermal_score
1,80,30,200,8
2,40,70,120,25
";

/// Ten devices, the last of which is far outside the others.
pub fn cohort_with_outlier_csv() -> String {
    let mut csv = String::from("gpu_id,avg_power_watts,avg_sm_pct,avg_mem_pct,thermal_score\n");
    for i in 0..9 {
        let jitter = f64::from(i);
        csv.push_str(&format!(
            "{},{},{},{},10\n",
            i + 1,
            150.0 + jitter,
            50.0 + jitter,
            40.0 + jitter
        ));
    }
    csv.push_str("10,400,99,5,35\n");
    csv
}
