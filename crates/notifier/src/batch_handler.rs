use crate::{ExpiryNotifier, NotifyError, Outcome};
use aws_lambda_events::dynamodb::{Event, EventRecord};
use aws_lambda_events::streams::{DynamoDbBatchItemFailure, DynamoDbEventResponse};
use lambda_runtime::tracing::instrument::Instrumented;
use lambda_runtime::tracing::{Instrument, Span};
use lambda_runtime::{tracing, Error, LambdaEvent};
use std::iter::Zip;
use std::vec::IntoIter;

/// Process one stream batch and report per-record failures.
///
/// The event source mapping *must* have `ReportBatchItemFailures` set:
/// only records listed in the response are redelivered, which is the
/// retry path for dispatch failures. Malformed records are deliberately
/// not listed, since redelivering an image that has no id can never
/// succeed.
pub async fn handle_stream_batch(
    notifier: &ExpiryNotifier,
    event: LambdaEvent<Event>,
) -> Result<DynamoDbEventResponse, Error> {
    let records: Vec<EventRecord> = event.payload.records;

    tracing::info!("Handling batch of [{}] stream records", records.len());

    // Start a task for each stream record
    let (ids, tasks): (Vec<String>, Vec<_>) = records
        .into_iter()
        .map(|record: EventRecord| {
            // The sequence number identifies the record in the
            // batch-failure response
            let sequence_number: String =
                record.change.sequence_number.clone().unwrap_or_default();

            let record_span: Span = tracing::span!(
                tracing::Level::INFO,
                "Stream record",
                sequence_number = %sequence_number
            );

            let task: Instrumented<_> =
                async move { notifier.handle(&record).await }.instrument(record_span);

            (sequence_number, task)
        })
        .unzip();

    // Per-key ordering is the store's concern; records within one
    // batch are for distinct keys or already ordered, so process them
    // concurrently
    let results: Vec<Result<Outcome, NotifyError>> = futures::future::join_all(tasks).await;

    let batch_item_failures: Vec<DynamoDbBatchItemFailure> =
        collect_batch_failures(ids.into_iter().zip(results));

    Ok(DynamoDbEventResponse {
        batch_item_failures,
    })
}

fn collect_batch_failures(
    results: Zip<IntoIter<String>, IntoIter<Result<Outcome, NotifyError>>>,
) -> Vec<DynamoDbBatchItemFailure> {
    results
        .filter_map(
            // Keep sequence numbers whose failure redelivery can fix
            |(sequence_number, result): (String, Result<Outcome, NotifyError>)| match result {
                Ok(_) => None,
                Err(NotifyError::MalformedEvent(reason)) => {
                    tracing::warn!("Dropping undecodable record {sequence_number}, {reason}");

                    None
                }
                Err(err) => {
                    tracing::error!("Failed to process record {sequence_number}, {err}");

                    Some(sequence_number)
                }
            },
        )
        .map(|sequence_number| DynamoDbBatchItemFailure {
            item_identifier: Some(sequence_number),
        })
        .collect()
}
