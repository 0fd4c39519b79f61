//! Application context built once at startup and shared by every handler.
//!
//! Both the cluster model and the record store are optional: a missing
//! model disables ingestion, a missing store leaves the service answering
//! with "waiting for data". Neither stops the process from serving.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::model::ClusterModel;
use crate::pipeline::BatchIdGenerator;
use crate::storage::{open_store, RecordStore, StoreHandle};

#[derive(Clone)]
pub struct AppContext {
    /// Loaded classification artifacts; `None` disables predictions
    pub model: Option<Arc<ClusterModel>>,
    pub store: Option<StoreHandle>,
    pub config: Arc<ServiceConfig>,
    pub batch_ids: Arc<BatchIdGenerator>,
}

impl AppContext {
    pub fn new(
        config: ServiceConfig,
        model: Option<ClusterModel>,
        store: Option<Arc<dyn RecordStore>>,
    ) -> Self {
        let timeout = Duration::from_millis(config.store.timeout_ms);
        Self {
            model: model.map(Arc::new),
            store: store.map(|s| StoreHandle::new(s, timeout)),
            config: Arc::new(config),
            batch_ids: Arc::new(BatchIdGenerator::new()),
        }
    }

    /// Load the model and open the store named by `config`, degrading on failure.
    pub fn from_config(config: ServiceConfig) -> Self {
        let model = match ClusterModel::load_from_dir(&config.model.dir) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(
                    dir = %config.model.dir.display(),
                    error = %e,
                    "Cluster model unavailable, predictions disabled"
                );
                None
            }
        };

        let store = match open_store(&config.store) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(uri = %config.store.uri, error = %e, "Record store unavailable");
                None
            }
        };

        info!(
            predictions = model.is_some(),
            store = store.as_ref().map_or("none", |s| s.backend_name()),
            "Application context ready"
        );
        Self::new(config, model, store)
    }

    pub fn predictions_enabled(&self) -> bool {
        self.model.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    #[test]
    fn test_missing_model_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::default();
        config.model.dir = dir.path().join("absent");
        config.store.uri = "memory://".to_string();

        let ctx = AppContext::from_config(config);
        assert!(!ctx.predictions_enabled());
        assert!(ctx.store.is_some());
    }

    #[test]
    fn test_bad_store_uri_degrades() {
        let mut config = ServiceConfig::default();
        config.store.uri = "mongodb://localhost:27017".to_string();
        let ctx = AppContext::from_config(config);
        assert!(ctx.store.is_none());
    }

    #[test]
    fn test_new_wraps_store() {
        let ctx = AppContext::new(
            ServiceConfig::default(),
            None,
            Some(Arc::new(InMemoryStore::new())),
        );
        assert_eq!(ctx.store.as_ref().map(|s| s.backend_name()), Some("memory"));
    }
}
