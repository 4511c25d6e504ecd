use crate::NotifyError;
use aws_lambda_events::dynamodb::EventRecord;
use chrono::DateTime;
use serde::Deserialize;

const REMOVE: &str = "REMOVE";

/// The single signal this pipeline reacts to. Everything else on the
/// feed (inserts, renewals) is somebody else's business.
///
/// Kept as an explicit predicate rather than a subscription-level
/// filter pattern so the narrowing is testable in-process; a deployment
/// may additionally push the same filter into the event source mapping.
pub fn is_removal(record: &EventRecord) -> bool {
    record.event_name == REMOVE
}

/// What the old image of a TTL-reaped record yields.
///
/// Only `id` is required; the store deleted the record autonomously, so
/// whatever else the image carries is all the context there is.
#[derive(Debug, Deserialize)]
pub struct ExpiredOrder {
    pub id: String,
    #[serde(rename = "pk", default)]
    pub owner_id: Option<String>,
    #[serde(rename = "sk", default)]
    pub sort_key: Option<String>,
    #[serde(rename = "TTL", default)]
    pub ttl: Option<i64>,
    #[serde(rename = "warrantyExpiry", default)]
    pub warranty_expiry: Option<i64>,
}

impl ExpiredOrder {
    /// Stable key identifying this logical removal across redelivery.
    ///
    /// TTL is non-decreasing across renewals, so the same removal
    /// always derives the same key while a later re-expiry of the same
    /// id derives a fresh one. The sort key carries the same property
    /// when the image lacks a TTL attribute.
    pub fn dedup_key(&self) -> String {
        match (&self.ttl, &self.sort_key) {
            (Some(ttl), _) => format!("{}#{}", self.id, ttl),
            (None, Some(sort_key)) => format!("{}#{}", self.id, sort_key),
            (None, None) => self.id.clone(),
        }
    }

    pub fn destination(&self) -> &str {
        self.owner_id.as_deref().unwrap_or(&self.id)
    }

    pub fn message(&self) -> String {
        match self
            .warranty_expiry
            .and_then(DateTime::from_timestamp_millis)
        {
            Some(expired_on) => format!(
                "Your warranty for order {} expired on {}",
                self.id,
                expired_on.format("%a %b %e %Y")
            ),
            None => format!("Your warranty for order {} has expired", self.id),
        }
    }
}

/// Extract the expiring record's identity from a remove event's old
/// image. An image without a decodable `id` is a malformed event.
pub fn decode_removal(record: &EventRecord) -> Result<ExpiredOrder, NotifyError> {
    serde_dynamo::from_item(record.change.old_image.clone())
        .map_err(|err| NotifyError::MalformedEvent(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{image_without_id, order_image, stream_record};

    #[test]
    fn only_remove_events_pass_the_filter() {
        let image = order_image("order-1", "owner-1", 1_777_000_000);

        assert!(is_removal(&stream_record("REMOVE", "1", image.clone())));
        assert!(!is_removal(&stream_record("INSERT", "2", image.clone())));
        assert!(!is_removal(&stream_record("MODIFY", "3", image)));
    }

    #[test]
    fn decodes_identity_and_context_from_old_image() {
        let record = stream_record("REMOVE", "1", order_image("order-1", "owner-1", 1_777_000_000));

        let expired = decode_removal(&record).unwrap();

        assert_eq!("order-1", expired.id);
        assert_eq!(Some("owner-1"), expired.owner_id.as_deref());
        assert_eq!(Some(1_777_000_000), expired.ttl);
        assert_eq!("owner-1", expired.destination());
        assert!(expired.message().contains("order-1"));
    }

    #[test]
    fn image_lacking_id_is_malformed() {
        let record = stream_record("REMOVE", "1", image_without_id("owner-1"));

        let err = decode_removal(&record).unwrap_err();

        assert!(matches!(err, NotifyError::MalformedEvent(_)));
    }

    #[test]
    fn dedup_key_tracks_ttl_then_sort_key() {
        let full = ExpiredOrder {
            id: "a".to_string(),
            owner_id: None,
            sort_key: Some("2026-05-01T12:00:00.000000Z".to_string()),
            ttl: Some(42),
            warranty_expiry: None,
        };
        assert_eq!("a#42", full.dedup_key());

        let no_ttl = ExpiredOrder { ttl: None, ..full };
        assert_eq!("a#2026-05-01T12:00:00.000000Z", no_ttl.dedup_key());

        let bare = ExpiredOrder {
            sort_key: None,
            ..no_ttl
        };
        assert_eq!("a", bare.dedup_key());
    }
}
