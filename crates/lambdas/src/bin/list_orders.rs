use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};
use lambdas::{error_response, json_response, message_response, OrdersEnv};
use service::RecordService;
use std::sync::Arc;
use store_dynamodb::DynamoRecordStore;

/// Handler for GET /user/{userId}, listing an owner's orders with the
/// oldest expiry first.
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
        list_orders(&service, event)
    }))
    .await
}

async fn list_orders(
    service: &RecordService,
    event: LambdaEvent<ApiGatewayV2httpRequest>,
) -> Result<ApiGatewayV2httpResponse, Error> {
    let owner_id: Option<&String> = event.payload.path_parameters.get("userId");

    let Some(owner_id) = owner_id else {
        return Ok(message_response(400, "Missing userId in path of URL"));
    };

    match service.list_by_owner(owner_id).await {
        Ok(records) => Ok(json_response(200, &records)),
        Err(err) => Ok(error_response(&err)),
    }
}
