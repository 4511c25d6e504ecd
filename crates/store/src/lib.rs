use async_trait::async_trait;
use model::{Error, OrderRecord, WarrantyStamp};
use std::fmt::{Display, Formatter};

/// Durable storage for order records.
///
/// The store is the single source of truth: callers never cache record
/// state, since stale TTL or expiry fields would corrupt renewal and
/// notification decisions. Records past their TTL are reaped by the
/// store autonomously; there is no delete operation here.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, record: OrderRecord) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<OrderRecord, StoreError>;

    /// All records for one owner, ascending by sort key. An empty
    /// result is not an error.
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<OrderRecord>, StoreError>;

    /// Rewrite the lifecycle fields of an existing record and return
    /// the updated image. Fails with `MissingEntry` if the record does
    /// not exist (including when it already expired and was reaped).
    async fn update(&self, id: &str, patch: RecordPatch) -> Result<OrderRecord, StoreError>;
}

/// Tracks which expiry removals have already been notified.
///
/// The change feed is at-least-once, so the same removal may arrive
/// more than once. Implementations must keep their own records
/// time-bounded; the table must not grow with every expiry forever.
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn already_notified(&self, dedup_key: &str) -> Result<bool, StoreError>;
    async fn mark_notified(&self, dedup_key: &str) -> Result<(), StoreError>;
}

/// The fields renewal rewrites: everything in the stamp plus the
/// cleared `expired` marker. The record's `id` is never touched.
#[derive(Debug, Clone)]
pub struct RecordPatch {
    pub stamp: WarrantyStamp,
    pub expired: Option<String>,
}

impl RecordPatch {
    pub fn renewal(stamp: WarrantyStamp) -> Self {
        RecordPatch {
            stamp,
            expired: None,
        }
    }
}

/// Errors arising from store access.
#[derive(Debug)]
pub struct StoreError {
    pub record_key: String,

    pub operation: StoreOperation,
    pub reason: StoreErrorReason,
}

#[derive(Debug)]
pub enum StoreErrorReason {
    // An expected record was missing.
    MissingEntry,
    // The stored item was not of the expected shape
    BadItem(String),
    // An error from the underlying store
    BackendFailure(Error),
}

#[derive(Debug, Clone)]
pub enum StoreOperation {
    PutRecord,
    GetRecord,
    QueryOwner,
    UpdateRecord,
    GetDedup,
    PutDedup,
}

impl StoreError {
    pub fn new(record_key: String, operation: StoreOperation, reason: StoreErrorReason) -> Self {
        StoreError {
            record_key,
            operation,
            reason,
        }
    }

    pub fn is_missing_entry(&self) -> bool {
        matches!(self.reason, StoreErrorReason::MissingEntry)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(format!("{:?}", self).as_str())
    }
}

impl std::error::Error for StoreError {}
