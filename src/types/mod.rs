//! Shared data types for the telemetry pipeline and its read-side analytics.

mod analytics;
mod telemetry;

pub use analytics::*;
pub use telemetry::*;
