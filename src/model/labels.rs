//! Cluster index → health class mapping and the policy for unmapped clusters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ModelError;
use crate::types::HealthClass;

/// What to do with a record whose cluster has no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedClusterPolicy {
    /// Reject the whole batch
    #[default]
    Reject,
    /// Label the record [`HealthClass::Unknown`]
    Unknown,
}

/// Fixed cluster → class table shipped with the model.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMapping {
    labels: BTreeMap<usize, HealthClass>,
}

impl LabelMapping {
    pub fn new(labels: BTreeMap<usize, HealthClass>) -> Self {
        Self { labels }
    }

    /// Parse the artifact form, where cluster indices are JSON object keys.
    pub fn from_artifact(table: BTreeMap<String, String>) -> Result<Self, ModelError> {
        let mut labels = BTreeMap::new();
        for (key, name) in table {
            let cluster = key.trim().parse::<usize>().map_err(|_| {
                ModelError::Inconsistent(format!("label mapping key '{key}' is not a cluster index"))
            })?;
            labels.insert(cluster, HealthClass::from(name));
        }
        if labels.is_empty() {
            return Err(ModelError::Inconsistent("label mapping is empty".to_string()));
        }
        Ok(Self { labels })
    }

    pub fn resolve(&self, cluster: usize) -> Option<&HealthClass> {
        self.labels.get(&cluster)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&usize, &HealthClass)> {
        self.labels.iter()
    }
}
