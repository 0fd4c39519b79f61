//! ReCore: accelerator telemetry classification and lifecycle analytics.
//!
//! ## Architecture
//!
//! - **Ingest**: CSV schema validation into typed telemetry rows
//! - **Model / Pipeline**: feature scaling, nearest-centroid clustering and
//!   label resolution against versioned artifacts
//! - **Storage**: atomic batch persistence (sled or in-memory)
//! - **Analytics**: read-time life score, recommendations, anomaly
//!   detection, comparisons and cohort aggregates
//! - **Report**: paginated lifecycle and comparison exports
//! - **API**: axum service tying the above together

pub mod analytics;
pub mod api;
pub mod config;
pub mod context;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;

pub use api::create_app;
pub use config::ServiceConfig;
pub use context::AppContext;
pub use model::ClusterModel;

pub use types::{
    AnomalyLabel, ClassifiedRecord, DerivedRecord, HealthClass, RecyclingCategory,
    TelemetryRecord, WorkloadProfile,
};
