//! Record store: pluggable persistence for classified batches.
//!
//! - [`SledStore`]: embedded on-disk store, the production default
//! - [`InMemoryStore`]: non-durable store for tests and `memory://`
//!
//! Handlers never call a backend directly. They go through [`StoreHandle`],
//! which moves each call onto the blocking pool and bounds it with the
//! configured timeout.

mod memory;
mod sled_store;

pub use memory::InMemoryStore;
pub use sled_store::SledStore;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::config::{StoreConfig, StoreLocation};
use crate::types::ClassifiedRecord;

/// Storage backend for classified batches.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait RecordStore: Send + Sync {
    /// Persist a batch atomically: either every record is stored or none.
    fn insert_batch(&self, records: &[ClassifiedRecord]) -> Result<(), StoreError>;

    /// All batch ids, ascending.
    fn batch_ids(&self) -> Result<Vec<String>, StoreError>;

    /// The most recently written batch id, if any.
    fn latest_batch_id(&self) -> Result<Option<String>, StoreError>;

    /// Records of one batch in upload order. Unknown ids give an empty vec.
    fn load_batch(&self, batch_id: &str) -> Result<Vec<ClassifiedRecord>, StoreError>;

    /// Records of the latest batch, empty when the store is empty.
    fn load_latest(&self) -> Result<Vec<ClassifiedRecord>, StoreError> {
        match self.latest_batch_id()? {
            Some(id) => self.load_batch(&id),
            None => Ok(Vec::new()),
        }
    }

    /// Delete one batch, returning how many records it held.
    fn remove_batch(&self, batch_id: &str) -> Result<usize, StoreError>;

    fn record_count(&self) -> Result<usize, StoreError>;

    /// Remove everything.
    fn clear(&self) -> Result<(), StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("batch {0} already exists")]
    Conflict(String),
    #[error("store call timed out after {0} ms")]
    Timeout(u64),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Open the backend named by the store config.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    let location = config.location().map_err(StoreError::Unavailable)?;
    let store: Arc<dyn RecordStore> = match location {
        StoreLocation::Memory => Arc::new(InMemoryStore::new()),
        StoreLocation::Sled(path) => Arc::new(SledStore::open(&path)?),
    };
    info!(backend = store.backend_name(), uri = %config.uri, "Record store opened");
    Ok(store)
}

/// Async front for a [`RecordStore`] with a per-call timeout.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl StoreHandle {
    pub fn new(inner: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    fn timeout_error(&self) -> StoreError {
        StoreError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
    }

    fn spawn<T, F>(&self, op: F) -> JoinHandle<Result<T, StoreError>>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore) -> Result<T, StoreError> + Send + 'static,
    {
        match tokio::time::timeout(self.timeout, self.spawn(op)).await {
            Ok(joined) => flatten(joined),
            Err(_) => Err(self.timeout_error()),
        }
    }

    /// Persist a batch. A write that overruns the timeout is still running
    /// on the blocking pool; it is awaited and undone before `Timeout` is
    /// returned, so a reported failure never leaves its batch visible.
    pub async fn insert_batch(&self, records: Vec<ClassifiedRecord>) -> Result<(), StoreError> {
        let Some(batch_id) = records.first().map(|r| r.batch_id.clone()) else {
            return Ok(());
        };
        let mut task = self.spawn(move |s| s.insert_batch(&records));
        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!(batch_id = %batch_id, "Batch insert timed out, rolling back");
                if flatten(task.await).is_ok() {
                    let rollback = self.spawn({
                        let batch_id = batch_id.clone();
                        move |s| s.remove_batch(&batch_id)
                    });
                    if let Err(e) = flatten(rollback.await) {
                        error!(batch_id = %batch_id, error = %e, "Rollback of timed-out batch failed");
                        return Err(e);
                    }
                }
                Err(self.timeout_error())
            }
        }
    }

    pub async fn batch_ids(&self) -> Result<Vec<String>, StoreError> {
        self.run(|s| s.batch_ids()).await
    }

    pub async fn load_batch(&self, batch_id: String) -> Result<Vec<ClassifiedRecord>, StoreError> {
        self.run(move |s| s.load_batch(&batch_id)).await
    }

    pub async fn load_latest(&self) -> Result<Vec<ClassifiedRecord>, StoreError> {
        self.run(|s| s.load_latest()).await
    }

    pub async fn record_count(&self) -> Result<usize, StoreError> {
        self.run(|s| s.record_count()).await
    }
}

fn flatten<T>(joined: Result<Result<T, StoreError>, JoinError>) -> Result<T, StoreError> {
    joined.unwrap_or_else(|e| Err(StoreError::Unavailable(format!("store task failed: {e}"))))
}

/// Storage key for record `index` of a batch.
pub(crate) fn record_key(batch_id: &str, index: usize) -> String {
    format!("{batch_id}/{index:08}")
}
