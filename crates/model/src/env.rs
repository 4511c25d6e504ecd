/// Environment variable naming the orders table
pub const ORDERS_TABLE_NAME: &str = "ORDERS_TABLE_NAME";
/// Environment variable naming the owner GSI on the orders table
pub const ORDERS_OWNER_INDEX: &str = "ORDERS_OWNER_INDEX";
/// Environment variable holding the warranty period in days
pub const WARRANTY_PERIOD_DAYS: &str = "WARRANTY_PERIOD_DAYS";
/// Environment variable naming the idempotency table
pub const DEDUP_TABLE_NAME: &str = "DEDUP_TABLE_NAME";
/// Environment variable holding the idempotency record retention in days
pub const DEDUP_RETENTION_DAYS: &str = "DEDUP_RETENTION_DAYS";
/// Environment variable holding the SNS topic for expiry notifications
pub const NOTIFY_TOPIC_ARN: &str = "NOTIFY_TOPIC_ARN";

/// Warranty period used when `WARRANTY_PERIOD_DAYS` is unset: two years,
/// matching the original product promise.
pub const DEFAULT_WARRANTY_PERIOD_DAYS: i64 = 730;
/// Idempotency records outlive stream redelivery by a wide margin
pub const DEFAULT_DEDUP_RETENTION_DAYS: i64 = 14;
