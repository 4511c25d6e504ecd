use aws_lambda_events::apigw::ApiGatewayV2httpResponse;
use aws_lambda_events::encodings::Body;
use chrono::Duration;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use model::env;
use serde::Serialize;
use serde_json::json;
use service::ServiceError;

/// A JSON API response in the shape the original HTTP API served:
/// the payload under a `data` key.
pub fn json_response(status_code: i64, data: &impl Serialize) -> ApiGatewayV2httpResponse {
    let mut headers: HeaderMap = HeaderMap::new();
    headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());

    ApiGatewayV2httpResponse {
        status_code,
        headers,
        body: Some(Body::Text(json!({ "data": data }).to_string())),
        ..Default::default()
    }
}

pub fn message_response(status_code: i64, message: &str) -> ApiGatewayV2httpResponse {
    json_response(status_code, &json!({ "message": message }))
}

/// Validation never retries (400), a missing record is a 404 and a
/// store failure surfaces as a 502 for the platform to retry.
pub fn error_response(err: &ServiceError) -> ApiGatewayV2httpResponse {
    match err {
        ServiceError::Validation(message) => message_response(400, message),
        ServiceError::NotFound(id) => {
            message_response(404, format!("No order found for id {id}").as_str())
        }
        ServiceError::Store(_) => message_response(502, err.to_string().as_str()),
    }
}

/// Orders table configuration, read once at startup and passed into
/// constructors explicitly.
pub struct OrdersEnv {
    pub table_name: String,
    pub owner_index: String,
    pub warranty_period: Duration,
}

impl OrdersEnv {
    pub fn from_env() -> Self {
        OrdersEnv {
            table_name: require_var(env::ORDERS_TABLE_NAME),
            owner_index: std::env::var(env::ORDERS_OWNER_INDEX)
                .unwrap_or_else(|_| "index1".to_string()),
            warranty_period: Duration::days(days_var(
                env::WARRANTY_PERIOD_DAYS,
                env::DEFAULT_WARRANTY_PERIOD_DAYS,
            )),
        }
    }
}

/// Notifier configuration: dedup table and notification topic.
pub struct NotifierEnv {
    pub dedup_table_name: String,
    pub dedup_retention: Duration,
    pub topic_arn: String,
}

impl NotifierEnv {
    pub fn from_env() -> Self {
        NotifierEnv {
            dedup_table_name: require_var(env::DEDUP_TABLE_NAME),
            dedup_retention: Duration::days(days_var(
                env::DEDUP_RETENTION_DAYS,
                env::DEFAULT_DEDUP_RETENTION_DAYS,
            )),
            topic_arn: require_var(env::NOTIFY_TOPIC_ARN),
        }
    }
}

fn require_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("Missing {name} environment variable"))
}

fn days_var(name: &str, default: i64) -> i64 {
    let days: i64 = match std::env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a number of days")),
        Err(_) => default,
    };

    // A zero or negative period would stamp TTLs in the past, which
    // the store reaps immediately
    if days <= 0 {
        panic!("{name} must be a positive number of days");
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{StoreError, StoreErrorReason, StoreOperation};

    #[test]
    fn json_response_wraps_payload_under_data() {
        let response = json_response(200, &json!({ "id": "order-1" }));

        assert_eq!(200, response.status_code);
        let body = match response.body.unwrap() {
            Body::Text(text) => text,
            other => panic!("expected text body, got {:?}", other),
        };
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!("order-1", value["data"]["id"]);
    }

    #[test]
    fn days_var_defaults_when_unset() {
        assert_eq!(730, days_var("LAMBDAS_TEST_DAYS_UNSET", 730));
    }

    #[test]
    fn days_var_reads_the_environment() {
        std::env::set_var("LAMBDAS_TEST_DAYS_SET", "14");

        assert_eq!(14, days_var("LAMBDAS_TEST_DAYS_SET", 730));
    }

    #[test]
    #[should_panic(expected = "positive number of days")]
    fn days_var_rejects_non_positive_periods() {
        std::env::set_var("LAMBDAS_TEST_DAYS_ZERO", "0");

        days_var("LAMBDAS_TEST_DAYS_ZERO", 730);
    }

    #[test]
    fn service_errors_map_to_http_statuses() {
        assert_eq!(
            400,
            error_response(&ServiceError::Validation("id is required".to_string())).status_code
        );
        assert_eq!(
            404,
            error_response(&ServiceError::NotFound("x".to_string())).status_code
        );
        assert_eq!(
            502,
            error_response(&ServiceError::Store(StoreError::new(
                "x".to_string(),
                StoreOperation::GetRecord,
                StoreErrorReason::BackendFailure("throttled".into()),
            )))
            .status_code
        );
    }
}
