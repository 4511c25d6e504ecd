use async_trait::async_trait;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::{GetItemError, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemError, PutItemOutput};
use aws_sdk_dynamodb::operation::query::QueryOutput;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use model::OrderRecord;
use store::StoreErrorReason::{BackendFailure, BadItem, MissingEntry};
use store::StoreOperation::{GetRecord, PutRecord, QueryOwner, UpdateRecord};
use store::{RecordPatch, RecordStore, StoreError};
use std::collections::HashMap;

mod dedup;

pub use dedup::DynamoDedupStore;

const ID: &str = "id";
const OWNER_KEY: &str = "pk";

/// Orders table access: hash key `id`, owner GSI on `(pk, sk)` with a
/// full projection, TTL enabled on the `TTL` attribute.
pub struct DynamoRecordStore {
    table_name: String,
    owner_index: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
    consistent_read: bool,
}

impl DynamoRecordStore {
    pub fn new(
        dynamodb_client: aws_sdk_dynamodb::Client,
        table_name: String,
        owner_index: String,
    ) -> Self {
        DynamoRecordStore {
            table_name,
            owner_index,
            dynamodb_client,
            consistent_read: true,
        }
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn put(&self, record: OrderRecord) -> Result<(), StoreError> {
        let id: String = record.id.clone();
        let item: HashMap<String, AttributeValue> =
            serde_dynamo::to_item(&record).map_err(|err| {
                StoreError::new(id.clone(), PutRecord, BadItem(err.to_string()))
            })?;

        self.put_item(item)
            .await
            .map_err(|err| StoreError::new(id, PutRecord, BackendFailure(err.into())))?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<OrderRecord, StoreError> {
        let output: GetItemOutput = self.get_item(id).await.map_err(|err| {
            StoreError::new(id.to_string(), GetRecord, BackendFailure(err.into()))
        })?;

        let item: HashMap<String, AttributeValue> = output
            .item
            .ok_or_else(|| StoreError::new(id.to_string(), GetRecord, MissingEntry))?;

        serde_dynamo::from_item(item).map_err(|err| {
            StoreError::new(id.to_string(), GetRecord, BadItem(err.to_string()))
        })
    }

    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<OrderRecord>, StoreError> {
        let mut records: Vec<OrderRecord> = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        // Drain every page; ascending range key order within each page
        // and across pages, so no re-sort is needed.
        loop {
            let output: QueryOutput = self
                .dynamodb_client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.owner_index)
                .key_condition_expression(format!("{OWNER_KEY} = :owner"))
                .expression_attribute_values(":owner", AttributeValue::S(owner_id.to_string()))
                .scan_index_forward(true)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|err| {
                    StoreError::new(owner_id.to_string(), QueryOwner, BackendFailure(err.into()))
                })?;

            let page: Vec<OrderRecord> = serde_dynamo::from_items(output.items.unwrap_or_default())
                .map_err(|err| {
                    StoreError::new(owner_id.to_string(), QueryOwner, BadItem(err.to_string()))
                })?;
            records.extend(page);

            start_key = output.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }

        Ok(records)
    }

    async fn update(&self, id: &str, patch: RecordPatch) -> Result<OrderRecord, StoreError> {
        let expired: AttributeValue = match patch.expired {
            Some(marker) => AttributeValue::S(marker),
            None => AttributeValue::Null(true),
        };

        let output = self
            .dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(ID, AttributeValue::S(id.to_string()))
            // TTL is a reserved word in update expressions
            .update_expression("SET #ttl = :ttl, sk = :sk, warrantyExpiry = :warranty, expired = :expired")
            .expression_attribute_names("#ttl", "TTL")
            .expression_attribute_values(":ttl", AttributeValue::N(patch.stamp.ttl.to_string()))
            .expression_attribute_values(":sk", AttributeValue::S(patch.stamp.sort_key))
            .expression_attribute_values(
                ":warranty",
                AttributeValue::N(patch.stamp.warranty_expiry.to_string()),
            )
            .expression_attribute_values(":expired", expired)
            .condition_expression("attribute_exists(id)")
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service_err) if service_err.is_conditional_check_failed_exception() => {
                    StoreError::new(id.to_string(), UpdateRecord, MissingEntry)
                }
                _ => StoreError::new(id.to_string(), UpdateRecord, BackendFailure(err.into())),
            })?;

        let item: HashMap<String, AttributeValue> = output.attributes.ok_or_else(|| {
            StoreError::new(
                id.to_string(),
                UpdateRecord,
                BadItem("update returned no attributes".to_string()),
            )
        })?;

        serde_dynamo::from_item(item).map_err(|err| {
            StoreError::new(id.to_string(), UpdateRecord, BadItem(err.to_string()))
        })
    }
}

impl DynamoRecordStore {
    async fn get_item(
        &self,
        id: &str,
    ) -> Result<GetItemOutput, SdkError<GetItemError, HttpResponse>> {
        self.dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .consistent_read(self.consistent_read)
            .key(ID, AttributeValue::S(id.to_string()))
            .send()
            .await
    }

    async fn put_item(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> Result<PutItemOutput, SdkError<PutItemError, HttpResponse>> {
        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
    use aws_sdk_dynamodb::types::error::ConditionalCheckFailedException;
    use aws_smithy_mocks::{mock, mock_client, Rule};
    use chrono::{Duration, Utc};
    use model::warranty_stamp;
    use serde_json::Map;

    fn store_with(rules: &[&Rule]) -> DynamoRecordStore {
        let client = mock_client!(aws_sdk_dynamodb, rules);
        DynamoRecordStore::new(client, "orders".to_string(), "index1".to_string())
    }

    fn sample_record() -> OrderRecord {
        OrderRecord::new(
            "owner-1".to_string(),
            Map::new(),
            warranty_stamp(Utc::now(), Duration::days(730)),
        )
    }

    #[tokio::test]
    async fn get_decodes_stored_item() {
        let record = sample_record();
        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record).unwrap();

        let get_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item)
            .then_output(move || GetItemOutput::builder().set_item(Some(item.clone())).build());

        let store = store_with(&[&get_rule]);
        let fetched = store.get(&record.id).await.unwrap();

        assert_eq!(record.id, fetched.id);
        assert_eq!(record.ttl, fetched.ttl);
        assert_eq!(record.sort_key, fetched.sort_key);
    }

    #[tokio::test]
    async fn get_maps_absent_item_to_missing_entry() {
        let get_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item)
            .then_output(|| GetItemOutput::builder().build());

        let store = store_with(&[&get_rule]);
        let err: StoreError = store.get("gone").await.unwrap_err();

        assert!(err.is_missing_entry());
    }

    #[tokio::test]
    async fn update_maps_conditional_failure_to_missing_entry() {
        let update_rule: Rule = mock!(aws_sdk_dynamodb::Client::update_item).then_error(|| {
            UpdateItemError::ConditionalCheckFailedException(
                ConditionalCheckFailedException::builder().build(),
            )
        });

        let store = store_with(&[&update_rule]);
        let stamp = warranty_stamp(Utc::now(), Duration::days(730));
        let err: StoreError = store
            .update("gone", RecordPatch::renewal(stamp))
            .await
            .unwrap_err();

        assert!(err.is_missing_entry());
    }
}
