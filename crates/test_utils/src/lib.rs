use async_trait::async_trait;
use aws_lambda_events::dynamodb::{Event, EventRecord};
use channel::{ChannelError, NotificationChannel};
use serde_json::{json, Value};
use store::StoreErrorReason::BackendFailure;
use store::StoreOperation::{GetDedup, PutDedup};
use store::{DedupStore, StoreError};
use std::sync::Mutex;

/// A DynamoDB-typed old image for an order record, as it appears in a
/// stream event.
pub fn order_image(id: &str, owner: &str, ttl: i64) -> Value {
    json!({
        "id": { "S": id },
        "pk": { "S": owner },
        "sk": { "S": "2026-05-01T12:00:00.000000Z" },
        "TTL": { "N": ttl.to_string() },
        "warrantyExpiry": { "N": (ttl * 1000).to_string() },
        "expired": { "NULL": true }
    })
}

/// An old image missing the `id` attribute, for malformed-event tests.
pub fn image_without_id(owner: &str) -> Value {
    json!({
        "pk": { "S": owner },
        "TTL": { "N": "1700000000" }
    })
}

/// A single stream record of the given kind carrying `old_image`.
pub fn stream_record(event_name: &str, sequence_number: &str, old_image: Value) -> EventRecord {
    serde_json::from_value(stream_record_json(event_name, sequence_number, old_image))
        .expect("stream record json should deserialize")
}

/// A whole stream event from pre-built record json values.
pub fn stream_event(records: Vec<Value>) -> Event {
    serde_json::from_value(json!({ "Records": records }))
        .expect("stream event json should deserialize")
}

pub fn stream_record_json(event_name: &str, sequence_number: &str, old_image: Value) -> Value {
    let keys: Value = match old_image.get("id") {
        Some(id) => json!({ "id": id }),
        None => json!({}),
    };

    json!({
        "awsRegion": "us-east-1",
        "eventID": format!("event-{sequence_number}"),
        "eventName": event_name,
        "eventSource": "aws:dynamodb",
        "eventSourceARN": "arn:aws:dynamodb:us-east-1:123456789012:table/orders/stream/2026-05-01T00:00:00.000",
        "eventVersion": "1.1",
        "dynamodb": {
            "ApproximateCreationDateTime": 1777000000.0,
            "Keys": keys,
            "OldImage": old_image,
            "NewImage": {},
            "SequenceNumber": sequence_number,
            "SizeBytes": 59,
            "StreamViewType": "NEW_AND_OLD_IMAGES"
        }
    })
}

/// Channel recording every send, for asserting dispatch counts.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, destination: &str, message: &str) -> Result<(), ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));

        Ok(())
    }
}

/// Channel failing the first `failures` sends, then recording.
pub struct FailingChannel {
    failures_remaining: Mutex<u32>,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl FailingChannel {
    pub fn new(failures: u32) -> Self {
        FailingChannel {
            failures_remaining: Mutex::new(failures),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationChannel for FailingChannel {
    async fn send(&self, destination: &str, message: &str) -> Result<(), ChannelError> {
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(ChannelError::BadRequest("channel down".to_string()));
        }

        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));

        Ok(())
    }
}

/// Dedup store whose reads and writes always fail, for exercising the
/// no-dispatch-without-an-idempotency-decision rule.
#[derive(Default)]
pub struct UnavailableDedupStore;

#[async_trait]
impl DedupStore for UnavailableDedupStore {
    async fn already_notified(&self, dedup_key: &str) -> Result<bool, StoreError> {
        Err(StoreError::new(
            dedup_key.to_string(),
            GetDedup,
            BackendFailure("dedup table unavailable".into()),
        ))
    }

    async fn mark_notified(&self, dedup_key: &str) -> Result<(), StoreError> {
        Err(StoreError::new(
            dedup_key.to_string(),
            PutDedup,
            BackendFailure("dedup table unavailable".into()),
        ))
    }
}
