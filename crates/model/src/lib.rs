use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub mod env;
pub mod lifecycle;

pub use lifecycle::{renewal_stamp, warranty_stamp, WarrantyStamp};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// An order with an attached warranty, as stored in the orders table.
///
/// Attribute names match the table on the wire: `pk`/`sk` form the
/// owner index key, `TTL` drives the store's autonomous deletion and
/// `warrantyExpiry` is the human-facing expiry in epoch milliseconds.
/// Any additional payload fields pass through `detail` untouched.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderRecord {
    pub id: String,
    #[serde(rename = "pk")]
    pub owner_id: String,
    #[serde(rename = "sk")]
    pub sort_key: String,
    #[serde(rename = "TTL")]
    pub ttl: i64,
    #[serde(rename = "warrantyExpiry")]
    pub warranty_expiry: i64,
    /// Reserved marker for a future grace state. Always written (as
    /// null) and cleared again on renewal; nothing sets it today.
    pub expired: Option<String>,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl OrderRecord {
    /// Build a fresh record for `owner_id` stamped from `stamp`.
    pub fn new(owner_id: String, detail: Map<String, Value>, stamp: WarrantyStamp) -> Self {
        OrderRecord {
            id: Uuid::new_v4().to_string(),
            owner_id,
            sort_key: stamp.sort_key,
            ttl: stamp.ttl,
            warranty_expiry: stamp.warranty_expiry,
            expired: None,
            detail,
        }
    }
}

/// Caller-supplied payload for order creation. `userId` is the only
/// required field; everything else is opaque and stored as-is.
#[derive(Debug, Deserialize, Clone)]
pub struct CreateOrder {
    #[serde(rename = "userId")]
    pub owner_id: String,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}
