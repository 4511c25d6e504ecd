use chrono::{Duration, Utc};
use model::{renewal_stamp, warranty_stamp, CreateOrder, OrderRecord, WarrantyStamp};
use store::{RecordPatch, RecordStore, StoreError};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Create / read / renew operations over the record store.
///
/// Owns the warranty lifecycle rules: every create and renew stamps
/// `TTL`, `warrantyExpiry` and `sk` from "now + warranty period" and
/// leaves `expired` cleared. Expiry itself is never performed here; the
/// store reaps records past their TTL and the notifier reacts to the
/// resulting feed events.
pub struct RecordService {
    record_store: Arc<dyn RecordStore>,
    warranty_period: Duration,
}

impl RecordService {
    /// Create a new `RecordService`; `warranty_period` is the fixed
    /// configured duration added to "now" at creation and renewal.
    pub fn new(record_store: Arc<dyn RecordStore>, warranty_period: Duration) -> Self {
        RecordService {
            record_store,
            warranty_period,
        }
    }

    pub async fn create(&self, payload: CreateOrder) -> Result<OrderRecord, ServiceError> {
        if payload.owner_id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "userId is required".to_string(),
            ));
        }

        let stamp: WarrantyStamp = self.fresh_stamp();
        let record = OrderRecord::new(payload.owner_id, payload.detail, stamp);

        self.record_store.put(record.clone()).await?;

        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<OrderRecord, ServiceError> {
        if id.trim().is_empty() {
            return Err(ServiceError::Validation("id is required".to_string()));
        }

        self.record_store
            .get(id)
            .await
            .map_err(|err| ServiceError::from_store(id, err))
    }

    /// All of one owner's records, ascending by sort key. An owner with
    /// no records gets an empty list, not an error.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OrderRecord>, ServiceError> {
        if owner_id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "userId is required".to_string(),
            ));
        }

        Ok(self.record_store.query_by_owner(owner_id).await?)
    }

    /// Push the warranty out by another full period.
    ///
    /// Rewrites `sk` as well: the owner index is the only durable trace
    /// of "state as of time T", so a renewal that kept the old sort key
    /// would be invisible to index consumers. The stamp is derived past
    /// the record's current TTL, so `sk`, `TTL` and `warrantyExpiry`
    /// strictly advance even when the renewal lands within the clock's
    /// granularity of the prior mutation.
    pub async fn renew(&self, id: &str) -> Result<OrderRecord, ServiceError> {
        if id.trim().is_empty() {
            return Err(ServiceError::Validation("id is required".to_string()));
        }

        let current: OrderRecord = self
            .record_store
            .get(id)
            .await
            .map_err(|err| ServiceError::from_store(id, err))?;

        let stamp: WarrantyStamp =
            renewal_stamp(Utc::now(), self.warranty_period, current.ttl);

        self.record_store
            .update(id, RecordPatch::renewal(stamp))
            .await
            .map_err(|err| ServiceError::from_store(id, err))
    }

    fn fresh_stamp(&self) -> WarrantyStamp {
        warranty_stamp(Utc::now(), self.warranty_period)
    }
}

#[derive(Debug)]
pub enum ServiceError {
    // Caller input missing required fields; never retried
    Validation(String),
    // The requested record does not exist (possibly already reaped)
    NotFound(String),
    // The store failed; retry is the platform's job
    Store(StoreError),
}

impl ServiceError {
    fn from_store(id: &str, err: StoreError) -> Self {
        if err.is_missing_entry() {
            ServiceError::NotFound(id.to_string())
        } else {
            ServiceError::Store(err)
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Validation(message) => write!(f, "validation failed: {message}"),
            ServiceError::NotFound(id) => write!(f, "no record found for id {id}"),
            ServiceError::Store(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl std::error::Error for ServiceError {}
