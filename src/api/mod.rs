//! REST API module using Axum
//!
//! Provides HTTP endpoints for the ReCore service:
//! - `POST /predict` CSV ingestion with a flat `{message}` / `{error}` contract
//! - `/api/v1` dashboard API with a consistent `{data, meta}` envelope

pub mod envelope;
pub mod handlers;
mod routes;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Build a CORS layer from `server.cors_origins`.
///
/// An empty list allows any origin, so a separately hosted dashboard can
/// read the API.
fn build_cors_layer(origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| o.parse().ok())
        .collect();
    if allowed.is_empty() {
        base.allow_origin(Any)
    } else {
        tracing::info!(origins = %origins, "CORS: allowing configured origins");
        base.allow_origin(allowed)
    }
}

/// Create the complete application router.
pub fn create_app(ctx: AppContext) -> Router {
    let cors = build_cors_layer(&ctx.config.server.cors_origins);
    let body_limit = ctx.config.server.max_upload_bytes;
    let timeout = Duration::from_secs(ctx.config.server.request_timeout_secs);

    Router::new()
        .nest("/api/v1", routes::api_routes(ctx.clone()))
        .merge(routes::ingest_routes(ctx))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
