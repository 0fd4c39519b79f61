//! Pretrained cluster model bundle.
//!
//! The model is three artifacts that ship together in one directory:
//!
//! | File | Contents |
//! |---|---|
//! | `scaler.json` | `{ "version": 1, "mean": [..], "scale": [..] }` |
//! | `kmeans_model.json` | `{ "version": 1, "centroids": [[..], ..] }` |
//! | `label_mapping.json` | `{ "version": 1, "labels": { "0": "Healthy", .. } }` or `{ "0": "Healthy", .. }` |
//!
//! It is loaded once at startup and never mutated. A missing or unreadable
//! artifact is reported as [`ModelError`]; callers keep running without
//! predictions.

mod assigner;
mod labels;
mod scaler;

pub use assigner::ClusterAssigner;
pub use labels::{LabelMapping, UnmappedClusterPolicy};
pub use scaler::FeatureScaler;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Scaler parameter artifact.
pub const SCALER_FILE: &str = "scaler.json";
/// Cluster centroid artifact.
pub const CENTROIDS_FILE: &str = "kmeans_model.json";
/// Cluster → label artifact.
pub const LABELS_FILE: &str = "label_mapping.json";

/// Artifact format version this build understands.
pub const ARTIFACT_VERSION: u32 = 1;

/// Errors raised while loading or assembling a model bundle.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model artifact missing: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read model artifact {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("failed to parse model artifact {}: {}", .0.display(), .1)]
    Parse(PathBuf, serde_json::Error),
    #[error("inconsistent model artifacts: {0}")]
    Inconsistent(String),
}

/// A feature vector whose width does not match the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} features, got {actual}")]
pub struct ShapeMismatch {
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Deserialize, Serialize)]
struct ScalerArtifact {
    #[serde(default = "default_version")]
    version: u32,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct CentroidsArtifact {
    #[serde(default = "default_version")]
    version: u32,
    centroids: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize, Serialize)]
struct LabelsArtifact {
    #[serde(default = "default_version")]
    version: u32,
    labels: BTreeMap<String, String>,
}

/// `label_mapping.json` is also accepted as a bare `{"0": "Healthy"}` map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelsFile {
    Versioned(LabelsArtifact),
    Flat(BTreeMap<String, String>),
}

impl From<LabelsFile> for LabelsArtifact {
    fn from(file: LabelsFile) -> Self {
        match file {
            LabelsFile::Versioned(artifact) => artifact,
            LabelsFile::Flat(labels) => Self {
                version: ARTIFACT_VERSION,
                labels,
            },
        }
    }
}

const fn default_version() -> u32 {
    ARTIFACT_VERSION
}

/// Scaler, centroids and label table, validated to agree with one another.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    scaler: FeatureScaler,
    assigner: ClusterAssigner,
    labels: LabelMapping,
}

impl ClusterModel {
    /// Assemble a model from parts, checking that the scaler and centroid
    /// dimensions agree.
    pub fn from_parts(
        scaler: FeatureScaler,
        assigner: ClusterAssigner,
        labels: LabelMapping,
    ) -> Result<Self, ModelError> {
        if scaler.n_features() != assigner.dim() {
            return Err(ModelError::Inconsistent(format!(
                "scaler has {} features but centroids have {} dimensions",
                scaler.n_features(),
                assigner.dim()
            )));
        }
        Ok(Self {
            scaler,
            assigner,
            labels,
        })
    }

    /// Load the three artifacts from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ModelError> {
        let scaler: ScalerArtifact = read_artifact(&dir.join(SCALER_FILE))?;
        let centroids: CentroidsArtifact = read_artifact(&dir.join(CENTROIDS_FILE))?;
        let labels: LabelsArtifact = read_artifact::<LabelsFile>(&dir.join(LABELS_FILE))?.into();

        if scaler.version != centroids.version || scaler.version != labels.version {
            return Err(ModelError::Inconsistent(format!(
                "artifact versions differ (scaler={}, centroids={}, labels={})",
                scaler.version, centroids.version, labels.version
            )));
        }
        if scaler.version != ARTIFACT_VERSION {
            return Err(ModelError::Inconsistent(format!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                scaler.version
            )));
        }

        let model = Self::from_parts(
            FeatureScaler::new(scaler.mean, scaler.scale)?,
            ClusterAssigner::new(centroids.centroids)?,
            LabelMapping::from_artifact(labels.labels)?,
        )?;

        info!(
            dir = %dir.display(),
            features = model.n_features(),
            clusters = model.assigner.n_clusters(),
            labels = model.labels.len(),
            "Cluster model loaded"
        );
        Ok(model)
    }

    /// Write the bundle to `dir` in artifact form.
    pub fn save_to_dir(&self, dir: &Path) -> Result<(), ModelError> {
        std::fs::create_dir_all(dir).map_err(|e| ModelError::Io(dir.to_path_buf(), e))?;

        let scaler = ScalerArtifact {
            version: ARTIFACT_VERSION,
            mean: self.scaler.mean().to_vec(),
            scale: self.scaler.scale().to_vec(),
        };
        let centroids = CentroidsArtifact {
            version: ARTIFACT_VERSION,
            centroids: self.assigner.centroids().to_vec(),
        };
        let labels = LabelsArtifact {
            version: ARTIFACT_VERSION,
            labels: self
                .labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.as_str().to_string()))
                .collect(),
        };

        write_artifact(&dir.join(SCALER_FILE), &scaler)?;
        write_artifact(&dir.join(CENTROIDS_FILE), &centroids)?;
        write_artifact(&dir.join(LABELS_FILE), &labels)
    }

    pub fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    pub fn assigner(&self) -> &ClusterAssigner {
        &self.assigner
    }

    pub fn labels(&self) -> &LabelMapping {
        &self.labels
    }
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    if !path.exists() {
        return Err(ModelError::Missing(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| ModelError::Io(path.to_path_buf(), e))?;
    serde_json::from_slice(&bytes).map_err(|e| ModelError::Parse(path.to_path_buf(), e))
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| ModelError::Parse(path.to_path_buf(), e))?;
    std::fs::write(path, json).map_err(|e| ModelError::Io(path.to_path_buf(), e))
}
