use async_trait::async_trait;
use aws_sdk_sns::types::MessageAttributeValue;
use channel::{ChannelError, NotificationChannel};

/// Notification channel publishing to an SNS topic.
///
/// The destination travels as an `owner` message attribute so topic
/// subscriptions can filter per owner.
pub struct SnsChannel {
    pub sns: aws_sdk_sns::Client,
    pub topic_arn: String,
}

impl SnsChannel {
    pub fn new(sns: aws_sdk_sns::Client, topic_arn: String) -> Self {
        Self { sns, topic_arn }
    }
}

#[async_trait]
impl NotificationChannel for SnsChannel {
    async fn send(&self, destination: &str, message: &str) -> Result<(), ChannelError> {
        let owner: MessageAttributeValue = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(destination)
            .build()
            .map_err(|err| ChannelError::BadRequest(err.to_string()))?;

        self.sns
            .publish()
            .topic_arn(self.topic_arn.as_str())
            .message(message)
            .message_attributes("owner", owner)
            .send()
            .await
            .map_err(|err| ChannelError::SendFailure(err.into()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sns::operation::publish::{PublishError, PublishOutput};
    use aws_sdk_sns::types::error::InvalidParameterException;
    use aws_smithy_mocks::{mock, mock_client, Rule};

    #[tokio::test]
    async fn publishes_message_with_owner_attribute() {
        let publish_rule: Rule = mock!(aws_sdk_sns::Client::publish)
            .match_requests(|request| {
                request.message.as_deref() == Some("warranty expired")
                    && request
                        .message_attributes
                        .as_ref()
                        .and_then(|attrs| attrs.get("owner"))
                        .and_then(|attr| attr.string_value.as_deref())
                        == Some("owner-1")
            })
            .then_output(|| PublishOutput::builder().message_id("m-1").build());

        let channel = SnsChannel::new(
            mock_client!(aws_sdk_sns, [&publish_rule]),
            "arn:aws:sns:us-east-1:123456789012:warranty".to_string(),
        );

        channel.send("owner-1", "warranty expired").await.unwrap();
    }

    #[tokio::test]
    async fn failed_publish_maps_to_send_failure() {
        let publish_rule: Rule = mock!(aws_sdk_sns::Client::publish).then_error(|| {
            PublishError::InvalidParameterException(
                InvalidParameterException::builder().build(),
            )
        });

        let channel = SnsChannel::new(
            mock_client!(aws_sdk_sns, [&publish_rule]),
            "arn:aws:sns:us-east-1:123456789012:warranty".to_string(),
        );

        let err: ChannelError = channel
            .send("owner-1", "warranty expired")
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::SendFailure(_)));
    }
}
