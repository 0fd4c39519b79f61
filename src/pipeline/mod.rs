//! Telemetry classification pipeline.
//!
//! ```text
//! CSV upload ─▶ schema validation ─▶ Feature Scaler ─▶ Cluster Assigner
//!                                                          │
//!                      persisted batch ◀─ Label Resolver ◀─┘
//! ```
//!
//! Everything here is synchronous and stateless apart from the shared,
//! read-only [`ClusterModel`](crate::model::ClusterModel).

pub mod batch_id;
pub mod classifier;

pub use batch_id::BatchIdGenerator;
pub use classifier::{assign_clusters, classify_batch, resolve_labels, scale_features};

use crate::ingest::{parse_telemetry_csv, IngestError};
use crate::model::{ClusterModel, UnmappedClusterPolicy};
use crate::types::ClassifiedRecord;

/// Classification failures returned to the ingestion caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("model unavailable: no cluster model is loaded, predictions are disabled")]
    ModelUnavailable,
    #[error("input shape error: {0}")]
    InputShape(String),
    #[error("cluster {cluster} has no label mapping")]
    UnmappedCluster { cluster: usize },
}

impl From<IngestError> for PipelineError {
    fn from(err: IngestError) -> Self {
        Self::InputShape(err.to_string())
    }
}

/// Parse and classify a CSV upload.
pub fn classify_csv(
    model: Option<&ClusterModel>,
    csv: &str,
    policy: UnmappedClusterPolicy,
    batch_id: &str,
) -> Result<Vec<ClassifiedRecord>, PipelineError> {
    // Check the model first so a degraded deployment reports the real cause.
    if model.is_none() {
        return Err(PipelineError::ModelUnavailable);
    }
    let rows = parse_telemetry_csv(csv)?;
    classify_batch(model, &rows, policy, batch_id)
}
