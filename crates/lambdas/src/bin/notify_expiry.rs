use aws_config::BehaviorVersion;
use aws_lambda_events::dynamodb::Event;
use channel_sns::SnsChannel;
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};
use lambdas::NotifierEnv;
use notifier::{handle_stream_batch, ExpiryNotifier};
use std::sync::Arc;
use store_dynamodb::DynamoDedupStore;

/// Orders table stream consumer notifying owners of warranty expiry.
///
/// The event source mapping must enable `ReportBatchItemFailures`;
/// failed records are retried through stream redelivery.
#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let env: NotifierEnv = NotifierEnv::from_env();
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;

    let dedup_store = Arc::new(DynamoDedupStore::new(
        aws_sdk_dynamodb::Client::new(&config),
        env.dedup_table_name,
        env.dedup_retention,
    ));
    let channel = Arc::new(SnsChannel::new(
        aws_sdk_sns::Client::new(&config),
        env.topic_arn,
    ));
    let notifier: ExpiryNotifier = ExpiryNotifier::new(dedup_store, channel);

    run(service_fn(|event: LambdaEvent<Event>| {
        handle_stream_batch(&notifier, event)
    }))
    .await
}
