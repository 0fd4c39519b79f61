//! Sled-backed record store.
//!
//! Key format: `{batch_id}/{index:08}`. Batch ids sort chronologically, so
//! the last key in the tree belongs to the latest batch and a prefix scan
//! returns one batch in upload order.

use sled::Db;
use std::path::Path;
use tracing::{debug, info};

use super::{record_key, RecordStore, StoreError};
use crate::types::ClassifiedRecord;

pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Storage(format!("create {}: {e}", parent.display())))?;
            }
        }
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing)
    pub fn open_temp() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    fn batch_of(key: &[u8]) -> Option<String> {
        let key = std::str::from_utf8(key).ok()?;
        key.rsplit_once('/').map(|(batch, _)| batch.to_string())
    }
}

impl RecordStore for SledStore {
    fn insert_batch(&self, records: &[ClassifiedRecord]) -> Result<(), StoreError> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let batch_id = first.batch_id.as_str();
        if let Some(r) = records.iter().find(|r| r.batch_id != batch_id) {
            return Err(StoreError::Storage(format!(
                "mixed batch ids in one insert: {batch_id} and {}",
                r.batch_id
            )));
        }
        if self.db.scan_prefix(format!("{batch_id}/")).next().is_some() {
            return Err(StoreError::Conflict(batch_id.to_string()));
        }

        let mut batch = sled::Batch::default();
        for (i, record) in records.iter().enumerate() {
            batch.insert(record_key(batch_id, i).as_bytes(), serde_json::to_vec(record)?);
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;

        info!(batch_id, records = records.len(), "Batch persisted");
        Ok(())
    }

    fn batch_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut next = self.db.first()?;
        while let Some((key, _)) = next {
            let Some(batch) = Self::batch_of(&key) else {
                break;
            };
            // '0' is the byte after '/': seek past every key of this batch.
            next = self.db.range(format!("{batch}0").into_bytes()..).next().transpose()?;
            ids.push(batch);
        }
        Ok(ids)
    }

    fn latest_batch_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self.db.last()?.and_then(|(key, _)| Self::batch_of(&key)))
    }

    fn load_batch(&self, batch_id: &str) -> Result<Vec<ClassifiedRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in self.db.scan_prefix(format!("{batch_id}/")) {
            let (_, value) = entry?;
            records.push(serde_json::from_slice::<ClassifiedRecord>(&value)?);
        }
        debug!(batch_id, records = records.len(), "Loaded batch");
        Ok(records)
    }

    fn remove_batch(&self, batch_id: &str) -> Result<usize, StoreError> {
        let mut batch = sled::Batch::default();
        let mut removed = 0;
        for entry in self.db.scan_prefix(format!("{batch_id}/")) {
            let (key, _) = entry?;
            batch.remove(key);
            removed += 1;
        }
        if removed > 0 {
            self.db.apply_batch(batch)?;
            self.db.flush()?;
            info!(batch_id, records = removed, "Batch removed");
        }
        Ok(removed)
    }

    fn record_count(&self) -> Result<usize, StoreError> {
        Ok(self.db.len())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.db.clear()?;
        self.db.flush()?;
        info!("Record store cleared");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
