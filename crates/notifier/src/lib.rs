use aws_lambda_events::dynamodb::EventRecord;
use channel::{ChannelError, NotificationChannel};
use lambda_runtime::tracing;
use store::{DedupStore, StoreError};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod batch_handler;
mod decode;

pub use batch_handler::handle_stream_batch;
pub use decode::{decode_removal, is_removal, ExpiredOrder};

/// Consumes the orders table change feed and notifies owners of
/// warranty expiry.
///
/// The feed is at-least-once and per-key ordered only; the notifier
/// narrows it to remove events (the TTL reaper's trace) and guarantees
/// at most one externally visible notification per distinct removal via
/// the dedup store. It never writes back to the orders table.
pub struct ExpiryNotifier {
    dedup_store: Arc<dyn DedupStore>,
    channel: Arc<dyn NotificationChannel>,
}

/// Terminal states for one feed record.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Not a remove event; nothing to do
    Ignored,
    /// This removal was already notified on an earlier delivery
    Duplicate,
    /// A notification went out and the dedup key was committed
    Notified,
}

impl ExpiryNotifier {
    pub fn new(dedup_store: Arc<dyn DedupStore>, channel: Arc<dyn NotificationChannel>) -> Self {
        ExpiryNotifier {
            dedup_store,
            channel,
        }
    }

    /// Process one feed record: filter, decode, dedup-check, dispatch.
    ///
    /// The dedup key is committed only after a successful dispatch, so
    /// a failed send leaves redelivery free to retry.
    pub async fn handle(&self, record: &EventRecord) -> Result<Outcome, NotifyError> {
        if !is_removal(record) {
            return Ok(Outcome::Ignored);
        }

        let expired: ExpiredOrder = decode_removal(record)?;
        let dedup_key: String = expired.dedup_key();

        let already_notified: bool = self
            .dedup_store
            .already_notified(&dedup_key)
            .await
            .map_err(NotifyError::DedupUnavailable)?;

        if already_notified {
            tracing::debug!(order_id = %expired.id, "Removal already notified, skipping");
            return Ok(Outcome::Duplicate);
        }

        self.channel
            .send(expired.destination(), &expired.message())
            .await
            .map_err(NotifyError::Dispatch)?;

        self.dedup_store
            .mark_notified(&dedup_key)
            .await
            .map_err(NotifyError::DedupUnavailable)?;

        tracing::info!(order_id = %expired.id, "Notified warranty expiry");

        Ok(Outcome::Notified)
    }
}

/// Errors arising while processing one feed record.
#[derive(Debug)]
pub enum NotifyError {
    // The record image had no decodable id; reported, then dropped
    MalformedEvent(String),
    // The notification channel failed; redelivery retries
    Dispatch(ChannelError),
    // No idempotency decision was possible; must not dispatch
    DedupUnavailable(StoreError),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::MalformedEvent(reason) => write!(f, "undecodable event: {reason}"),
            NotifyError::Dispatch(err) => write!(f, "dispatch failed: {err}"),
            NotifyError::DedupUnavailable(err) => write!(f, "dedup store unavailable: {err}"),
        }
    }
}

impl std::error::Error for NotifyError {}
