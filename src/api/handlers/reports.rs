//! Report export endpoints.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use super::{latest_cohort, CompareQuery};
use crate::analytics::{compare, AnomalyReport};
use crate::api::envelope::ApiErrorResponse;
use crate::context::AppContext;
use crate::report::{
    comparison_report, lifecycle_report, Document, DocumentRenderer, JsonRenderer,
    PlainTextRenderer,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

fn render(doc: &Document, format: &ReportFormat) -> Response {
    let renderer: &dyn DocumentRenderer = match format {
        ReportFormat::Text => &PlainTextRenderer,
        ReportFormat::Json => &JsonRenderer,
    };
    match renderer.render(doc) {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, renderer.content_type())],
            bytes,
        )
            .into_response(),
        Err(e) => ApiErrorResponse::internal(format!("report rendering failed: {e}")),
    }
}

/// GET /api/v1/report
pub async fn get_report(State(ctx): State<AppContext>, Query(q): Query<ReportQuery>) -> Response {
    let records = match latest_cohort(&ctx).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let config = ctx.config.anomaly.clone();
    let built = tokio::task::spawn_blocking(move || {
        let anomalies = AnomalyReport::from_records(&records, &config);
        lifecycle_report(&records, &anomalies, Utc::now())
    })
    .await;
    match built {
        Ok(doc) => render(&doc, &q.format),
        Err(e) => ApiErrorResponse::internal(format!("report generation failed: {e}")),
    }
}

#[derive(Debug, Deserialize)]
pub struct CompareReportQuery {
    pub a: Option<String>,
    pub b: Option<String>,
    #[serde(default)]
    pub format: ReportFormat,
}

/// GET /api/v1/report/compare?a=1&b=2
pub async fn get_comparison_report(
    State(ctx): State<AppContext>,
    Query(q): Query<CompareReportQuery>,
) -> Response {
    let records = match latest_cohort(&ctx).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let devices = CompareQuery { a: q.a, b: q.b };
    match devices.resolve(&records) {
        Ok((a, b)) => render(&comparison_report(&compare(a, b), Utc::now()), &q.format),
        Err(resp) => resp,
    }
}
