use async_trait::async_trait;
use model::Error;
use std::fmt::{Display, Formatter};

/// An opaque outbound notification channel.
///
/// Success or failure of one send is the only observable contract; no
/// ordering or batching is assumed. A failed send is retryable at the
/// feed-redelivery granularity, so implementations should not retry
/// internally.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<(), ChannelError>;
}

/// Errors arising from dispatching a notification.
#[derive(Debug)]
pub enum ChannelError {
    // The channel rejected the destination or message
    BadRequest(String),
    // The channel itself failed
    SendFailure(Error),
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(format!("{:?}", self).as_str())
    }
}

impl std::error::Error for ChannelError {}
