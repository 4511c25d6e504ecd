use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use store::StoreErrorReason::{BackendFailure, BadItem};
use store::StoreOperation::{GetDedup, PutDedup};
use store::{DedupStore, StoreError};
use std::collections::HashMap;

pub(crate) const DEDUP_KEY: &str = "dedup_key";

/// One row per notified expiry, keyed by the dedup key derived from the
/// removal event. The row carries its own TTL (`expiry_timestamp`) so
/// the table stays bounded; the retention only needs to outlive stream
/// redelivery of the same removal.
///
/// This matches the `IdempotencyRecord` layout used by the
/// lambda-powertools idempotency utilities.
#[derive(Debug, Serialize, Deserialize)]
struct DedupRecord {
    dedup_key: String,
    notified_at: i64,
    expiry_timestamp: i64,
}

/// Idempotency tracking table: hash key `dedup_key`, TTL enabled on
/// `expiry_timestamp`.
pub struct DynamoDedupStore {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
    retention: Duration,
}

impl DynamoDedupStore {
    pub fn new(
        dynamodb_client: aws_sdk_dynamodb::Client,
        table_name: String,
        retention: Duration,
    ) -> Self {
        DynamoDedupStore {
            table_name,
            dynamodb_client,
            retention,
        }
    }
}

#[async_trait]
impl DedupStore for DynamoDedupStore {
    async fn already_notified(&self, dedup_key: &str) -> Result<bool, StoreError> {
        let output = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            // A stale miss here risks a duplicate notification
            .consistent_read(true)
            .key(DEDUP_KEY, AttributeValue::S(dedup_key.to_string()))
            .send()
            .await
            .map_err(|err| {
                StoreError::new(dedup_key.to_string(), GetDedup, BackendFailure(err.into()))
            })?;

        Ok(output.item.is_some())
    }

    async fn mark_notified(&self, dedup_key: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        let record = DedupRecord {
            dedup_key: dedup_key.to_string(),
            notified_at: now.timestamp(),
            expiry_timestamp: (now + self.retention).timestamp(),
        };

        let item: HashMap<String, AttributeValue> =
            serde_dynamo::to_item(&record).map_err(|err| {
                StoreError::new(dedup_key.to_string(), PutDedup, BadItem(err.to_string()))
            })?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| {
                StoreError::new(dedup_key.to_string(), PutDedup, BackendFailure(err.into()))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::get_item::GetItemOutput;
    use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
    use aws_smithy_mocks::{mock, mock_client, Rule};

    fn dedup_with(rules: &[&Rule]) -> DynamoDedupStore {
        let client = mock_client!(aws_sdk_dynamodb, rules);
        DynamoDedupStore::new(client, "dedup".to_string(), Duration::days(14))
    }

    #[tokio::test]
    async fn absent_row_means_not_yet_notified() {
        let get_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item)
            .then_output(|| GetItemOutput::builder().build());

        let dedup = dedup_with(&[&get_rule]);

        assert!(!dedup.already_notified("order-1#1700000000").await.unwrap());
    }

    #[tokio::test]
    async fn present_row_means_already_notified() {
        let get_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item).then_output(|| {
            GetItemOutput::builder()
                .item(
                    DEDUP_KEY,
                    AttributeValue::S("order-1#1700000000".to_string()),
                )
                .build()
        });

        let dedup = dedup_with(&[&get_rule]);

        assert!(dedup.already_notified("order-1#1700000000").await.unwrap());
    }

    #[tokio::test]
    async fn mark_writes_a_time_bounded_row() {
        let put_rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .match_requests(|request| {
                let item = request.item.as_ref().unwrap();
                let expiry: i64 = item["expiry_timestamp"].as_n().unwrap().parse().unwrap();
                let notified: i64 = item["notified_at"].as_n().unwrap().parse().unwrap();

                item[DEDUP_KEY].as_s().unwrap() == "order-1#1700000000"
                    && expiry > notified
            })
            .then_output(|| PutItemOutput::builder().build());

        let dedup = dedup_with(&[&put_rule]);

        dedup.mark_notified("order-1#1700000000").await.unwrap();
    }
}
