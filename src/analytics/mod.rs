//! Read-side analytics over classified records.
//!
//! Nothing in this module is persisted: derived metrics, anomaly labels,
//! recommendations and cohort aggregates are recomputed from stored
//! [`ClassifiedRecord`](crate::types::ClassifiedRecord)s whenever a view is
//! requested.

pub mod anomaly;
pub mod comparison;
pub mod derived;
pub mod recommendations;
pub mod summary;

pub use anomaly::{detect_anomalies, AnomalyConfig, AnomalyReport, DeviceAnomaly};
pub use comparison::{compare, workload_profile, Comparison, ComparisonRow, COMPARISON_FIELDS};
pub use derived::{derive, derive_all, efficiency_score, is_high_risk, life_score};
pub use recommendations::{maintenance_actions, maintenance_summary, recycling_category, MaintenanceAction};
pub use summary::{select_devices, CohortSummary, CorrelationMatrix, StressProfile};
