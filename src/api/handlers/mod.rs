//! API route handlers
//!
//! - Ingestion: CSV upload, classification, batch persistence
//! - Dashboard: derived views over the latest batch
//! - Reports: lifecycle and comparison exports

mod dashboard;
mod ingest;
mod reports;

pub use dashboard::*;
pub use ingest::*;
pub use reports::*;

use axum::response::Response;
use serde::Deserialize;
use tracing::warn;

use crate::analytics::derive_all;
use crate::api::envelope::ApiErrorResponse;
use crate::context::AppContext;
use crate::types::DerivedRecord;

/// `?gpu_ids=1,2,3`; absent or empty selects every device.
#[derive(Debug, Default, Deserialize)]
pub struct GpuFilter {
    #[serde(default)]
    pub gpu_ids: Option<String>,
}

impl GpuFilter {
    pub fn ids(&self) -> Vec<String> {
        self.gpu_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// `?a=<gpu_id>&b=<gpu_id>`
#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub a: Option<String>,
    pub b: Option<String>,
}

impl CompareQuery {
    /// Look both devices up in the cohort. They must be given and distinct.
    pub fn resolve<'r>(
        &self,
        records: &'r [DerivedRecord],
    ) -> Result<(&'r DerivedRecord, &'r DerivedRecord), Response> {
        let (Some(a), Some(b)) = (self.a.as_deref(), self.b.as_deref()) else {
            return Err(ApiErrorResponse::bad_request(
                "both 'a' and 'b' device ids are required",
            ));
        };
        if a == b {
            return Err(ApiErrorResponse::bad_request(
                "select two different devices to compare",
            ));
        }
        let find = |id: &str| {
            records
                .iter()
                .find(|r| r.gpu_id() == id)
                .ok_or_else(|| ApiErrorResponse::not_found(format!("device {id} not in latest batch")))
        };
        Ok((find(a)?, find(b)?))
    }
}

/// Derived records of the latest batch, or the error response to send.
pub(crate) async fn latest_cohort(ctx: &AppContext) -> Result<Vec<DerivedRecord>, Response> {
    let Some(store) = ctx.store.as_ref() else {
        return Err(ApiErrorResponse::service_unavailable("record store unavailable"));
    };
    match store.load_latest().await {
        Ok(records) if records.is_empty() => Err(ApiErrorResponse::waiting_for_data()),
        Ok(records) => Ok(derive_all(&records)),
        Err(e) => {
            warn!(error = %e, "Latest batch query failed");
            Err(ApiErrorResponse::query_failed(e))
        }
    }
}
