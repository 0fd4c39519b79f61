//! API route definitions
//!
//! - `/` and `/predict`: ingestion surface
//! - `/api/v1/*`: dashboard reads and report exports

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::context::AppContext;

/// Root-level ingestion routes.
pub fn ingest_routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/predict", post(handlers::predict))
        .with_state(ctx)
}

/// Dashboard API, nested under `/api/v1`.
pub fn api_routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/status", get(handlers::get_status))
        .route("/batches", get(handlers::get_batches))
        .route("/batches/latest", get(handlers::get_latest_batch))
        .route("/summary", get(handlers::get_summary))
        .route("/anomalies", get(handlers::get_anomalies))
        .route("/recommendations", get(handlers::get_recommendations))
        .route("/correlations", get(handlers::get_correlations))
        .route("/compare", get(handlers::get_compare))
        // Report exports
        .route("/report", get(handlers::get_report))
        .route("/report/compare", get(handlers::get_comparison_report))
        .with_state(ctx)
}
