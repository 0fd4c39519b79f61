//! In-memory record store for tests and minimal deployments.
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{RecordStore, StoreError};
use crate::types::ClassifiedRecord;

#[derive(Default)]
pub struct InMemoryStore {
    batches: RwLock<BTreeMap<String, Vec<ClassifiedRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Storage(e.to_string())
}

impl RecordStore for InMemoryStore {
    fn insert_batch(&self, records: &[ClassifiedRecord]) -> Result<(), StoreError> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        if records.iter().any(|r| r.batch_id != first.batch_id) {
            return Err(StoreError::Storage("mixed batch ids in one insert".to_string()));
        }
        let mut batches = self.batches.write().map_err(poisoned)?;
        if batches.contains_key(&first.batch_id) {
            return Err(StoreError::Conflict(first.batch_id.clone()));
        }
        batches.insert(first.batch_id.clone(), records.to_vec());
        Ok(())
    }

    fn batch_ids(&self) -> Result<Vec<String>, StoreError> {
        let batches = self.batches.read().map_err(poisoned)?;
        Ok(batches.keys().cloned().collect())
    }

    fn latest_batch_id(&self) -> Result<Option<String>, StoreError> {
        let batches = self.batches.read().map_err(poisoned)?;
        Ok(batches.keys().next_back().cloned())
    }

    fn load_batch(&self, batch_id: &str) -> Result<Vec<ClassifiedRecord>, StoreError> {
        let batches = self.batches.read().map_err(poisoned)?;
        Ok(batches.get(batch_id).cloned().unwrap_or_default())
    }

    fn remove_batch(&self, batch_id: &str) -> Result<usize, StoreError> {
        let mut batches = self.batches.write().map_err(poisoned)?;
        Ok(batches.remove(batch_id).map_or(0, |r| r.len()))
    }

    fn record_count(&self) -> Result<usize, StoreError> {
        let batches = self.batches.read().map_err(poisoned)?;
        Ok(batches.values().map(Vec::len).sum())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.batches.write().map_err(poisoned)?.clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
