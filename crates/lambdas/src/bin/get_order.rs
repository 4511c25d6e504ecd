use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};
use lambdas::{error_response, json_response, message_response, OrdersEnv};
use service::RecordService;
use std::sync::Arc;
use store_dynamodb::DynamoRecordStore;

/// Handler for GET /order/{id}, a point lookup by order id.
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
        get_order(&service, event)
    }))
    .await
}

async fn get_order(
    service: &RecordService,
    event: LambdaEvent<ApiGatewayV2httpRequest>,
) -> Result<ApiGatewayV2httpResponse, Error> {
    let id: Option<&String> = event.payload.path_parameters.get("id");

    let Some(id) = id else {
        return Ok(message_response(400, "Missing id in path of URL"));
    };

    match service.get(id).await {
        Ok(record) => Ok(json_response(200, &record)),
        Err(err) => Ok(error_response(&err)),
    }
}
