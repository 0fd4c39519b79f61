//! Dashboard read endpoints over the latest batch.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use super::{latest_cohort, CompareQuery, GpuFilter};
use crate::analytics::{
    compare, select_devices, AnomalyReport, CohortSummary, CorrelationMatrix,
};
use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::context::AppContext;
use crate::types::{DerivedRecord, HealthClass, RecyclingCategory};

#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub backend: &'static str,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub predictions_enabled: bool,
    pub model_clusters: Option<usize>,
    pub store: Option<StoreStatus>,
    pub batch_count: usize,
    pub record_count: usize,
    pub latest_batch: Option<String>,
}

/// GET /api/v1/status
pub async fn get_status(State(ctx): State<AppContext>) -> Response {
    let mut resp = StatusResponse {
        predictions_enabled: ctx.predictions_enabled(),
        model_clusters: ctx.model.as_ref().map(|m| m.assigner().n_clusters()),
        store: None,
        batch_count: 0,
        record_count: 0,
        latest_batch: None,
    };

    if let Some(store) = ctx.store.as_ref() {
        let ids = store.batch_ids().await;
        let count = store.record_count().await;
        let reachable = ids.is_ok() && count.is_ok();
        if let Ok(ids) = ids {
            resp.batch_count = ids.len();
            resp.latest_batch = ids.last().cloned();
        }
        resp.record_count = count.unwrap_or(0);
        resp.store = Some(StoreStatus {
            backend: store.backend_name(),
            reachable,
        });
    }

    ApiResponse::ok(resp)
}

/// GET /api/v1/batches
pub async fn get_batches(State(ctx): State<AppContext>) -> Response {
    let Some(store) = ctx.store.as_ref() else {
        return ApiErrorResponse::service_unavailable("record store unavailable");
    };
    match store.batch_ids().await {
        Ok(ids) => ApiResponse::ok(ids),
        Err(e) => ApiErrorResponse::query_failed(e),
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub batch_id: String,
    pub total_records: usize,
    pub records: Vec<DerivedRecord>,
}

/// GET /api/v1/batches/latest
pub async fn get_latest_batch(State(ctx): State<AppContext>) -> Response {
    let records = match latest_cohort(&ctx).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    ApiResponse::ok(BatchResponse {
        batch_id: records
            .first()
            .map(|r| r.record.batch_id.clone())
            .unwrap_or_default(),
        total_records: records.len(),
        records,
    })
}

/// GET /api/v1/summary?gpu_ids=1,2
pub async fn get_summary(State(ctx): State<AppContext>, Query(filter): Query<GpuFilter>) -> Response {
    match latest_cohort(&ctx).await {
        Ok(records) => {
            let cohort = select_devices(&records, &filter.ids());
            ApiResponse::ok(CohortSummary::from_records(&cohort))
        }
        Err(resp) => resp,
    }
}

/// GET /api/v1/anomalies?gpu_ids=1,2
pub async fn get_anomalies(State(ctx): State<AppContext>, Query(filter): Query<GpuFilter>) -> Response {
    match latest_cohort(&ctx).await {
        Ok(records) => {
            let cohort = select_devices(&records, &filter.ids());
            let config = ctx.config.anomaly.clone();
            // Forest construction is CPU-bound.
            match tokio::task::spawn_blocking(move || AnomalyReport::from_records(&cohort, &config)).await {
                Ok(report) => ApiResponse::ok(report),
                Err(e) => ApiErrorResponse::internal(format!("anomaly detection failed: {e}")),
            }
        }
        Err(resp) => resp,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "GPU_ID")]
    pub gpu_id: String,
    pub health_class: HealthClass,
    pub life_score: f64,
    pub maintenance: String,
    pub recycling: RecyclingCategory,
}

/// GET /api/v1/recommendations
pub async fn get_recommendations(
    State(ctx): State<AppContext>,
    Query(filter): Query<GpuFilter>,
) -> Response {
    match latest_cohort(&ctx).await {
        Ok(records) => {
            let recs: Vec<Recommendation> = select_devices(&records, &filter.ids())
                .into_iter()
                .map(|r| Recommendation {
                    gpu_id: r.record.gpu_id,
                    health_class: r.health_class,
                    life_score: r.life_score,
                    maintenance: r.maintenance,
                    recycling: r.recycling,
                })
                .collect();
            ApiResponse::ok(recs)
        }
        Err(resp) => resp,
    }
}

/// GET /api/v1/correlations?gpu_ids=1,2
pub async fn get_correlations(
    State(ctx): State<AppContext>,
    Query(filter): Query<GpuFilter>,
) -> Response {
    match latest_cohort(&ctx).await {
        Ok(records) => {
            let cohort = select_devices(&records, &filter.ids());
            ApiResponse::ok(CorrelationMatrix::from_records(&cohort))
        }
        Err(resp) => resp,
    }
}

/// GET /api/v1/compare?a=1&b=2
pub async fn get_compare(State(ctx): State<AppContext>, Query(q): Query<CompareQuery>) -> Response {
    let records = match latest_cohort(&ctx).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match q.resolve(&records) {
        Ok((a, b)) => ApiResponse::ok(compare(a, b)),
        Err(resp) => resp,
    }
}
