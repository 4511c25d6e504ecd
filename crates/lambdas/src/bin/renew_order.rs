use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use chrono::DateTime;
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};
use lambdas::{error_response, json_response, message_response, OrdersEnv};
use model::OrderRecord;
use serde_json::json;
use service::RecordService;
use std::sync::Arc;
use store_dynamodb::DynamoRecordStore;

/// Handler for PUT /renew?id=..., pushing the warranty out by another
/// full period.
#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let env: OrdersEnv = OrdersEnv::from_env();
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = Arc::new(DynamoRecordStore::new(
        aws_sdk_dynamodb::Client::new(&config),
        env.table_name,
        env.owner_index,
    ));
    let service: RecordService = RecordService::new(store, env.warranty_period);

    run(service_fn(|event: LambdaEvent<ApiGatewayV2httpRequest>| {
        renew_order(&service, event)
    }))
    .await
}

async fn renew_order(
    service: &RecordService,
    event: LambdaEvent<ApiGatewayV2httpRequest>,
) -> Result<ApiGatewayV2httpResponse, Error> {
    let id: Option<&str> = event.payload.query_string_parameters.first("id");

    let Some(id) = id else {
        return Ok(message_response(400, "Missing id query parameter in url"));
    };

    match service.renew(id).await {
        Ok(record) => Ok(json_response(
            200,
            &json!({
                "id": record.id,
                "message": format!(
                    "Your order is renewed. The warranty will expire on {}",
                    expiry_date(&record)
                ),
            }),
        )),
        Err(err) => Ok(error_response(&err)),
    }
}

fn expiry_date(record: &OrderRecord) -> String {
    DateTime::from_timestamp_millis(record.warranty_expiry)
        .map(|expiry| expiry.format("%a %b %e %Y").to_string())
        .unwrap_or_else(|| record.sort_key.clone())
}
