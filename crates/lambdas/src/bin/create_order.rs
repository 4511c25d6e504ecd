use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};
use lambdas::{error_response, json_response, message_response, OrdersEnv};
use model::CreateOrder;
use service::RecordService;
use std::sync::Arc;
use store_dynamodb::DynamoRecordStore;

/// Handler for POST /, creating an order with a fresh warranty.
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
        create_order(&service, event)
    }))
    .await
}

async fn create_order(
    service: &RecordService,
    event: LambdaEvent<ApiGatewayV2httpRequest>,
) -> Result<ApiGatewayV2httpResponse, Error> {
    let body: String = event.payload.body.unwrap_or_default();

    let payload: CreateOrder = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return Ok(message_response(
                400,
                format!("Invalid order payload: {err}").as_str(),
            ))
        }
    };

    match service.create(payload).await {
        Ok(record) => Ok(json_response(201, &record)),
        Err(err) => Ok(error_response(&err)),
    }
}
