//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and drive the
//! ingestion endpoint plus every /api/v1/* view with
//! `tower::ServiceExt::oneshot()`. No binary spawn, no network port.

mod common;

use recore::storage::{InMemoryStore, RecordStore};
use recore::{create_app, AppContext, ServiceConfig};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn test_context(with_model: bool) -> AppContext {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
    AppContext::new(
        ServiceConfig::default(),
        with_model.then(common::thermal_model),
        Some(store),
    )
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("GET {uri} did not return JSON ({e})"));
    (status, json)
}

async fn upload(app: &axum::Router, csv: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap();
    let (status, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Upload succeeds and reports the new batch.
#[tokio::test]
async fn test_predict_returns_batch_summary() {
    let app = create_app(test_context(true));

    let (status, json) = upload(&app, common::THREE_DEVICE_CSV).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "success");
    assert_eq!(json["total_records"], 3);
    assert!(json["batch_id"].as_str().unwrap().ends_with('Z'));
}

/// The batch written by /predict is exactly what /batches/latest reads back.
#[tokio::test]
async fn test_latest_batch_matches_upload() {
    let app = create_app(test_context(true));
    let (_, uploaded) = upload(&app, common::THREE_DEVICE_CSV).await;

    let (status, json) = get_json(&app, "/api/v1/batches/latest").await;
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["batch_id"], uploaded["batch_id"]);
    assert_eq!(data["total_records"], 3);

    let classes: Vec<&str> = data["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Predicted_Class"].as_str().unwrap())
        .collect();
    assert_eq!(classes, vec!["Healthy", "Moderate", "Critical"]);

    let life: Vec<f64> = data["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["life_score"].as_f64().unwrap())
        .collect();
    assert_eq!(life, vec![65.0, 50.0, 35.0]);
}

/// A second upload becomes the latest batch; the first is still listed.
#[tokio::test]
async fn test_second_upload_supersedes_first() {
    let app = create_app(test_context(true));
    let (_, first) = upload(&app, common::THREE_DEVICE_CSV).await;
    let (_, second) = upload(&app, common::WORKLOAD_CSV).await;
    assert_ne!(first["batch_id"], second["batch_id"]);

    let (_, batches) = get_json(&app, "/api/v1/batches").await;
    let ids: Vec<&str> = batches["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], first["batch_id"].as_str().unwrap());
    assert_eq!(ids[1], second["batch_id"].as_str().unwrap());

    let (_, latest) = get_json(&app, "/api/v1/batches/latest").await;
    assert_eq!(latest["data"]["batch_id"], second["batch_id"]);
    assert_eq!(latest["data"]["total_records"], 2);
}

/// Recommendations carry maintenance text and recycling bands.
#[tokio::test]
async fn test_recommendations_bands() {
    let app = create_app(test_context(true));
    upload(&app, common::THREE_DEVICE_CSV).await;

    let (status, json) = get_json(&app, "/api/v1/recommendations").await;
    assert_eq!(status, StatusCode::OK);
    let recs = json["data"].as_array().unwrap();
    assert_eq!(recs.len(), 3);

    assert_eq!(recs[0]["recycling"], "Consider partial recycling");
    assert_eq!(recs[1]["recycling"], "Consider partial recycling");
    assert_eq!(recs[2]["recycling"], "Recycle / retire");

    assert_eq!(recs[0]["maintenance"], "None");
    assert_eq!(recs[1]["maintenance"], "Clean fans, reapply thermal paste");
}

/// Summary honours the device filter.
#[tokio::test]
async fn test_summary_with_filter() {
    let app = create_app(test_context(true));
    upload(&app, common::THREE_DEVICE_CSV).await;

    let (_, all) = get_json(&app, "/api/v1/summary").await;
    assert_eq!(all["data"]["total_devices"], 3);
    assert_eq!(all["data"]["avg_life_score"], 50.0);

    let (_, some) = get_json(&app, "/api/v1/summary?gpu_ids=2,3").await;
    assert_eq!(some["data"]["total_devices"], 2);
    assert_eq!(some["data"]["avg_life_score"], 42.5);
}

/// The outlier device is the only one flagged.
#[tokio::test]
async fn test_anomalies_flag_outlier() {
    let app = create_app(test_context(true));
    upload(&app, &common::cohort_with_outlier_csv()).await;

    let (status, json) = get_json(&app, "/api/v1/anomalies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 10);
    assert_eq!(json["data"]["anomalies"], 1);

    let flagged: Vec<&str> = json["data"]["labels"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["Anomaly"] == "Anomaly")
        .map(|d| d["GPU_ID"].as_str().unwrap())
        .collect();
    assert_eq!(flagged, vec!["10"]);
}

/// Readings near the f64 limits still produce every analytics view.
#[tokio::test]
async fn test_extreme_magnitudes_keep_views_available() {
    let app = create_app(test_context(true));
    let mut csv = common::cohort_with_outlier_csv();
    csv.push_str("11,1.7e308,50,40,10\n");
    csv.push_str("12,-1.7e308,50,40,10\n");
    let (status, _) = upload(&app, &csv).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get_json(&app, "/api/v1/anomalies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 12);

    for uri in ["/api/v1/summary", "/api/v1/correlations"] {
        let (status, _) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
    }

    let (status, body) = send(
        &app,
        Request::builder().uri("/api/v1/report").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("GPU_ID: 12"));
}

/// Correlation matrix is square over the correlated fields.
#[tokio::test]
async fn test_correlations_shape() {
    let app = create_app(test_context(true));
    upload(&app, common::THREE_DEVICE_CSV).await;

    let (status, json) = get_json(&app, "/api/v1/correlations").await;
    assert_eq!(status, StatusCode::OK);
    let fields = json["data"]["fields"].as_array().unwrap();
    let r = json["data"]["r"].as_array().unwrap();
    assert_eq!(r.len(), fields.len());
    assert_eq!(json["data"]["sample_count"], 3);
}

/// Comparison reports workload profiles for both sides.
#[tokio::test]
async fn test_compare_two_devices() {
    let app = create_app(test_context(true));
    upload(&app, common::WORKLOAD_CSV).await;

    let (status, json) = get_json(&app, "/api/v1/compare?a=1&b=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["a"]["workload"], "Compute-Intensive");
    assert_eq!(json["data"]["b"]["workload"], "Memory-Intensive");
    assert_eq!(json["data"]["rows"].as_array().unwrap().len(), 8);
}

/// Comparing a device with itself is rejected; an unknown device is a 404.
#[tokio::test]
async fn test_compare_rejects_bad_selection() {
    let app = create_app(test_context(true));
    upload(&app, common::WORKLOAD_CSV).await;

    let (status, json) = get_json(&app, "/api/v1/compare?a=1&b=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");

    let (status, _) = get_json(&app, "/api/v1/compare?a=1&b=99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Views answer "waiting for data" until the first upload.
#[tokio::test]
async fn test_empty_store_waits_for_data() {
    let app = create_app(test_context(true));

    for uri in [
        "/api/v1/batches/latest",
        "/api/v1/summary",
        "/api/v1/anomalies",
        "/api/v1/recommendations",
        "/api/v1/correlations",
        "/api/v1/report",
    ] {
        let (status, json) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "GET {uri}");
        assert_eq!(json["error"]["code"], "WAITING_FOR_DATA", "GET {uri}");
    }

    let (status, json) = get_json(&app, "/api/v1/batches").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].as_array().unwrap().is_empty());
}

/// Without a model, ingestion is refused but reads keep working.
#[tokio::test]
async fn test_missing_model_disables_predict_only() {
    let app = create_app(test_context(false));

    let (status, json) = upload(&app, common::THREE_DEVICE_CSV).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().contains("model unavailable"));

    let (status, json) = get_json(&app, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["predictions_enabled"], false);
    assert_eq!(json["data"]["store"]["backend"], "memory");
}

/// Schema violations reject the whole upload.
#[tokio::test]
async fn test_predict_rejects_bad_schema() {
    let app = create_app(test_context(true));

    let (status, json) = upload(&app, "gpu_id,thermal_score,fan_rpm\n1,10,2000\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("fan_rpm"));

    let (status, _) = upload(&app, "gpu_id,thermal_score\n1,hot\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, batches) = get_json(&app, "/api/v1/batches").await;
    assert!(batches["data"].as_array().unwrap().is_empty());
}

/// Status reflects the stored batches.
#[tokio::test]
async fn test_status_after_upload() {
    let app = create_app(test_context(true));
    let (_, uploaded) = upload(&app, common::THREE_DEVICE_CSV).await;

    let (_, json) = get_json(&app, "/api/v1/status").await;
    let data = &json["data"];
    assert_eq!(data["predictions_enabled"], true);
    assert_eq!(data["model_clusters"], 3);
    assert_eq!(data["batch_count"], 1);
    assert_eq!(data["record_count"], 3);
    assert_eq!(data["latest_batch"], uploaded["batch_id"]);
    assert_eq!(data["store"]["reachable"], true);
}

/// Lifecycle report renders as text by default and as JSON on request.
#[tokio::test]
async fn test_lifecycle_report_formats() {
    let app = create_app(test_context(true));
    upload(&app, common::THREE_DEVICE_CSV).await;

    let (status, body) = send(
        &app,
        Request::builder().uri("/api/v1/report").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("Processor Lifecycle Summary Report"));
    assert!(text.contains("GPU_ID: 3 | Class: Critical | Life Score: 35.0"));

    let (status, json) = get_json(&app, "/api/v1/report?format=json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pages"].as_array().unwrap().len(), 1);
}

/// Comparison report names both devices.
#[tokio::test]
async fn test_comparison_report() {
    let app = create_app(test_context(true));
    upload(&app, common::WORKLOAD_CSV).await;

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api/v1/report/compare?a=1&b=2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("GPU Comparison Report: GPU 1 vs GPU 2"));
    assert!(text.contains("Compute-Intensive Workloads (AI/ML, HPC)"));
}
