//! Ingestion endpoint: `POST /predict` with a CSV body.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::context::AppContext;
use crate::pipeline::{classify_csv, PipelineError};
use crate::storage::StoreError;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub message: &'static str,
    pub total_records: usize,
    pub batch_id: String,
}

#[derive(Debug, Serialize)]
pub struct PredictError {
    pub error: String,
}

fn predict_error(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(PredictError { error: msg.into() })).into_response()
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match self {
            PipelineError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::InputShape(_) | PipelineError::UnmappedCluster { .. } => {
                StatusCode::BAD_REQUEST
            }
        };
        predict_error(status, self.to_string())
    }
}

fn store_failure(e: &StoreError) -> Response {
    let status = match e {
        StoreError::Serialization(_) | StoreError::Conflict(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    predict_error(status, format!("store unavailable: {e}"))
}

/// Classify an uploaded CSV and persist it as one new batch.
pub async fn predict(State(ctx): State<AppContext>, body: Bytes) -> Response {
    let Some(model) = ctx.model.clone() else {
        return PipelineError::ModelUnavailable.into_response();
    };
    let Some(store) = ctx.store.clone() else {
        return predict_error(StatusCode::SERVICE_UNAVAILABLE, "store unavailable: no record store configured");
    };
    let csv = match String::from_utf8(body.to_vec()) {
        Ok(s) => s,
        Err(e) => {
            return PipelineError::InputShape(format!("body is not UTF-8 text: {e}")).into_response()
        }
    };

    let batch_id = ctx.batch_ids.next_id();
    let policy = ctx.config.model.unmapped_cluster;
    let task_batch_id = batch_id.clone();
    let classified = tokio::task::spawn_blocking(move || {
        classify_csv(Some(Arc::as_ref(&model)), &csv, policy, &task_batch_id)
    })
    .await;

    let records = match classified {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => {
            warn!(batch_id = %batch_id, error = %e, "Upload rejected");
            return e.into_response();
        }
        Err(e) => {
            error!(error = %e, "Classification task failed");
            return predict_error(StatusCode::INTERNAL_SERVER_ERROR, "classification task failed");
        }
    };

    let total_records = records.len();
    if let Err(e) = store.insert_batch(records).await {
        error!(batch_id = %batch_id, error = %e, "Failed to persist batch");
        return store_failure(&e);
    }

    info!(batch_id = %batch_id, total_records, "Upload ingested");
    (
        StatusCode::OK,
        Json(PredictResponse {
            message: "success",
            total_records,
            batch_id,
        }),
    )
        .into_response()
}

pub async fn root() -> &'static str {
    "Backend Running"
}
