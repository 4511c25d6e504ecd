use async_trait::async_trait;
use model::OrderRecord;
use store::StoreErrorReason::MissingEntry;
use store::StoreOperation::{GetRecord, UpdateRecord};
use store::{DedupStore, RecordPatch, RecordStore, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Hashmap-backed record store for tests and local runs.
///
/// Nothing reaps expired records here; tests drive "the store deleted
/// it" by removing records and replaying the matching feed event.
pub struct InMemoryRecordStore {
    records: Arc<Mutex<HashMap<String, OrderRecord>>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        InMemoryRecordStore {
            records: Arc::new(Mutex::new(Default::default())),
        }
    }
}

impl InMemoryRecordStore {
    /// Drop a record as the TTL reaper would, returning the last image.
    pub fn reap(&self, id: &str) -> Option<OrderRecord> {
        self.records.lock().unwrap().remove(id)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn put(&self, record: OrderRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), record);

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<OrderRecord, StoreError> {
        let guard = self.records.lock().unwrap();
        let record: OrderRecord = guard
            .get(id)
            .ok_or_else(|| StoreError::new(id.to_string(), GetRecord, MissingEntry))?
            .clone();

        Ok(record)
    }

    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<OrderRecord>, StoreError> {
        let guard = self.records.lock().unwrap();
        let mut records: Vec<OrderRecord> = guard
            .values()
            .filter(|record| record.owner_id == owner_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        Ok(records)
    }

    async fn update(&self, id: &str, patch: RecordPatch) -> Result<OrderRecord, StoreError> {
        let mut guard = self.records.lock().unwrap();
        let record: &mut OrderRecord = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::new(id.to_string(), UpdateRecord, MissingEntry))?;

        record.sort_key = patch.stamp.sort_key;
        record.ttl = patch.stamp.ttl;
        record.warranty_expiry = patch.stamp.warranty_expiry;
        record.expired = patch.expired;

        Ok(record.clone())
    }
}

/// Hashset-backed dedup store for tests.
pub struct InMemoryDedupStore {
    notified: Arc<Mutex<HashSet<String>>>,
}

impl Default for InMemoryDedupStore {
    fn default() -> Self {
        InMemoryDedupStore {
            notified: Arc::new(Mutex::new(Default::default())),
        }
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn already_notified(&self, dedup_key: &str) -> Result<bool, StoreError> {
        Ok(self.notified.lock().unwrap().contains(dedup_key))
    }

    async fn mark_notified(&self, dedup_key: &str) -> Result<(), StoreError> {
        self.notified.lock().unwrap().insert(dedup_key.to_string());

        Ok(())
    }
}
