//! Router tests that never reach the database.
//!
//! The pool connects lazily to an address nothing listens on, so every
//! request here must be answered before a query runs.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use customer_accounts_core::AdjustmentPercentage;
use customer_accounts_service::config::{
    BrokerConfig, LoanPolicyConfig, LogFormat, ServiceConfig,
};
use customer_accounts_service::routes::app_router;
use customer_accounts_service::state::AppState;

fn test_config() -> ServiceConfig {
    ServiceConfig {
        database_url: SecretString::from("postgres://localhost:1/unused"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        statement_timeout: Duration::from_secs(1),
        loans: LoanPolicyConfig {
            default_limit: Decimal::from(5000),
            adjustment_percentage: AdjustmentPercentage::new(10),
        },
        broker: BrokerConfig {
            url: SecretString::from("amqp://localhost:1"),
            exchange: "loan.limit.exchange".to_string(),
            routing_key: "loan.limit.routingKey".to_string(),
            queue: "loan.limit.queue".to_string(),
            consumer_tag: "customer-accounts-test".to_string(),
        },
        log_format: LogFormat::Text,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

fn app() -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://localhost:1/unused")
        .unwrap();
    app_router(AppState::new(Arc::new(test_config()), pool))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_ok_without_database() {
    let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn readiness_reports_unreachable_database() {
    let (status, _) = send(Request::get("/health/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn create_customer_rejects_invalid_fields() {
    let body = json!({
        "firstName": "",
        "lastName": "Otieno",
        "email": "amina-at-example.com",
        "phoneNumber": "+254712345678",
        "currency": "KES",
        "nationalId": "12345678",
        "income": 200
    });

    let (status, body) = send(json_request("POST", "/customer", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["data"]["firstName"], "First name is required");
    assert_eq!(body["data"]["email"], "Invalid email format");
    assert_eq!(body["data"]["income"], "Income must be at least 500");
    assert!(body["data"].get("phoneNumber").is_none());
}

#[tokio::test]
async fn create_customer_rejects_malformed_json() {
    let request = Request::post("/customer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"firstName\": "))
        .unwrap();

    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn list_customers_rejects_small_page_size() {
    let request = Request::get("/customer?page=1&size=2")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["size"], "size must be greater than or equal to 5");
}

#[tokio::test]
async fn list_customers_rejects_page_zero() {
    let request = Request::get("/customer?page=0").body(Body::empty()).unwrap();

    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["page"], "page must be greater than or equal to 1");
}

#[tokio::test]
async fn list_customers_accepts_blank_parameters() {
    let request = Request::get("/customer?phoneNumber=&nationalId=&active=&id=&page=&size=")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;

    // Validation passes, so the request only fails on the unreachable database.
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn list_customers_reports_malformed_numbers_per_field() {
    let request = Request::get("/customer?active=yes&id=abc")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["active"], "active must be 0 or 1");
    assert_eq!(body["data"]["id"], "id must be a whole number");
}

#[tokio::test]
async fn set_loan_limit_rejects_amounts_beyond_column_range() {
    let body = json!({ "creditLimit": "100000000000000000000", "availableLimit": 10 });

    let (status, body) = send(json_request("POST", "/customer/1/set-loan-limit", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["data"]["creditLimit"],
        "creditLimit must be less than 100000000000000000"
    );
}

#[tokio::test]
async fn deactivate_rejects_non_numeric_id() {
    let request = Request::put("/customer/abc/deactivate")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn set_loan_limit_rejects_negative_amounts() {
    let body = json!({ "creditLimit": 1000, "availableLimit": -5, "currency": "USD" });

    let (status, body) = send(json_request("POST", "/customer/1/set-loan-limit", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["availableLimit"], "availableLimit must not be negative");
    assert!(body["data"].get("creditLimit").is_none());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _) = send(Request::get("/customers").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
