//! Classification stages: scale → assign → resolve.
//!
//! Each stage takes the optional loaded model and fails with
//! [`PipelineError::ModelUnavailable`] when there is none. Stages never
//! truncate or pad: a width mismatch anywhere rejects the whole batch.

use tracing::{debug, info, warn};

use super::PipelineError;
use crate::ingest::IngestRow;
use crate::model::{ClusterModel, UnmappedClusterPolicy};
use crate::types::{ClassifiedRecord, HealthClass, NUM_FEATURES};

/// Normalize raw feature rows with the model's scaler.
pub fn scale_features<R>(
    model: Option<&ClusterModel>,
    rows: &[R],
) -> Result<Vec<Vec<f64>>, PipelineError>
where
    R: AsRef<[f64]> + Sync,
{
    let model = model.ok_or(PipelineError::ModelUnavailable)?;
    model
        .scaler()
        .transform_batch(rows)
        .map_err(|e| PipelineError::InputShape(format!("feature scaler: {e}")))
}

/// Map normalized rows to cluster indices.
pub fn assign_clusters<R: AsRef<[f64]>>(
    model: Option<&ClusterModel>,
    matrix: &[R],
) -> Result<Vec<usize>, PipelineError> {
    let model = model.ok_or(PipelineError::ModelUnavailable)?;
    model
        .assigner()
        .assign_all(matrix)
        .map_err(|e| PipelineError::InputShape(format!("cluster assigner: {e}")))
}

/// Map cluster indices to health classes under the given fallback policy.
pub fn resolve_labels(
    model: Option<&ClusterModel>,
    clusters: &[usize],
    policy: UnmappedClusterPolicy,
) -> Result<Vec<HealthClass>, PipelineError> {
    let model = model.ok_or(PipelineError::ModelUnavailable)?;
    clusters
        .iter()
        .map(|&cluster| match (model.labels().resolve(cluster), policy) {
            (Some(class), _) => Ok(class.clone()),
            (None, UnmappedClusterPolicy::Unknown) => {
                warn!(cluster, "Cluster has no label mapping, labelling Unknown");
                Ok(HealthClass::Unknown)
            }
            (None, UnmappedClusterPolicy::Reject) => Err(PipelineError::UnmappedCluster { cluster }),
        })
        .collect()
}

/// Classify one upload into persisted records sharing `batch_id`.
///
/// Rows without a device ID get their 1-based position in the upload.
pub fn classify_batch(
    model: Option<&ClusterModel>,
    rows: &[IngestRow],
    policy: UnmappedClusterPolicy,
    batch_id: &str,
) -> Result<Vec<ClassifiedRecord>, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::InputShape("batch has no rows".to_string()));
    }

    let features: Vec<[f64; NUM_FEATURES]> = rows.iter().map(|r| r.telemetry.features()).collect();
    let scaled = scale_features(model, &features)?;
    let clusters = assign_clusters(model, &scaled)?;
    let classes = resolve_labels(model, &clusters, policy)?;

    let records: Vec<ClassifiedRecord> = rows
        .iter()
        .zip(clusters.iter().zip(classes))
        .enumerate()
        .map(|(i, (row, (&cluster, predicted_class)))| ClassifiedRecord {
            gpu_id: row.gpu_id.clone().unwrap_or_else(|| (i + 1).to_string()),
            telemetry: row.telemetry,
            cluster,
            predicted_class,
            batch_id: batch_id.to_string(),
        })
        .collect();

    debug!(batch_id, records = records.len(), "Batch scaled and assigned");
    info!(
        batch_id,
        records = records.len(),
        unknown = records
            .iter()
            .filter(|r| r.predicted_class == HealthClass::Unknown)
            .count(),
        "Batch classified"
    );
    Ok(records)
}
