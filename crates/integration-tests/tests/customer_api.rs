//! Integration tests for the customer HTTP API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The service running (cargo run -p customer-accounts-service)
//!
//! Run with: cargo test -p customer-accounts-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use customer_accounts_integration_tests::{
    base_url, decimal, random_national_id, registration_body,
};

async fn register(client: &Client, national_id: &str) -> (StatusCode, Value) {
    let resp = client
        .post(format!("{}/customer", base_url()))
        .json(&registration_body(national_id))
        .send()
        .await
        .expect("Failed to register customer");
    let status = resp.status();
    (status, resp.json().await.expect("Failed to read response"))
}

async fn find_by_national_id(client: &Client, national_id: &str, active: i32) -> Value {
    client
        .get(format!(
            "{}/customer?nationalId={national_id}&active={active}",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to list customers")
        .json()
        .await
        .expect("Failed to read response")
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_register_customer_creates_limit_and_preferences() {
    let client = Client::new();
    let national_id = random_national_id();

    let (status, body) = register(&client, &national_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Customer created successfully");

    let customer = &body["data"];
    assert_eq!(customer["nationalId"], national_id.as_str());
    assert_eq!(customer["active"], 1);
    assert_eq!(decimal(&customer["loanLimits"]["availableLimit"]), Decimal::ZERO);
    assert_eq!(customer["loanLimits"]["currency"], "KES");
    assert_eq!(customer["customerPreferences"]["smsNotifications"], true);
    assert_eq!(customer["customerPreferences"]["emailNotifications"], false);
    assert_eq!(customer["customerPreferences"]["pushNotifications"], true);
}

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_duplicate_active_national_id_conflicts() {
    let client = Client::new();
    let national_id = random_national_id();

    let (status, _) = register(&client, &national_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = register(&client, &national_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Customer with this National ID already exists.");
}

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_national_id_is_reusable_after_deactivation() {
    let client = Client::new();
    let national_id = random_national_id();

    let (_, body) = register(&client, &national_id).await;
    let id = body["data"]["id"].as_i64().expect("customer id");

    client
        .put(format!("{}/customer/{id}/deactivate", base_url()))
        .send()
        .await
        .expect("Failed to deactivate");

    let (status, _) = register(&client, &national_id).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_register_rejects_invalid_body() {
    let client = Client::new();
    let mut body = registration_body(&random_national_id());
    body["nationalId"] = json!("12");
    body["currency"] = json!("");

    let resp = client
        .post(format!("{}/customer", base_url()))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["data"]["nationalId"], "National ID must be between 6 and 10 digits");
    assert_eq!(body["data"]["currency"], "Currency cannot be empty");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_list_filters_and_paginates() {
    let client = Client::new();
    let national_id = random_national_id();
    register(&client, &national_id).await;

    let body = find_by_national_id(&client, &national_id, 1).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Customer retrieved");
    let page = &body["data"];
    assert_eq!(page["page"], 1);
    assert_eq!(page["size"], 10);
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["last"], true);
    assert_eq!(page["content"][0]["nationalId"], national_id.as_str());
    assert!(page["content"][0]["loanLimits"].is_object());
}

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_list_defaults_to_active_customers() {
    let client = Client::new();
    let national_id = random_national_id();
    let (_, body) = register(&client, &national_id).await;
    let id = body["data"]["id"].as_i64().expect("customer id");

    client
        .put(format!("{}/customer/{id}/deactivate", base_url()))
        .send()
        .await
        .expect("Failed to deactivate");

    let active = client
        .get(format!("{}/customer?nationalId={national_id}", base_url()))
        .send()
        .await
        .expect("Failed to list customers")
        .json::<Value>()
        .await
        .expect("Failed to read response");
    assert_eq!(active["data"]["totalElements"], 0);

    let inactive = find_by_national_id(&client, &national_id, 0).await;
    assert_eq!(inactive["data"]["totalElements"], 1);
}

// ============================================================================
// Deactivation
// ============================================================================

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_deactivate_twice() {
    let client = Client::new();
    let (_, body) = register(&client, &random_national_id()).await;
    let id = body["data"]["id"].as_i64().expect("customer id");
    let created = body["data"]["dateCreated"].clone();

    let resp = client
        .put(format!("{}/customer/{id}/deactivate", base_url()))
        .send()
        .await
        .expect("Failed to deactivate");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["active"], 0);
    assert_eq!(body["data"]["dateCreated"], created);
    assert!(body["data"]["dateModified"].is_string());

    let resp = client
        .put(format!("{}/customer/{id}/deactivate", base_url()))
        .send()
        .await
        .expect("Failed to deactivate");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Customer is already inactive.");
}

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_deactivate_unknown_customer() {
    let client = Client::new();
    let id = i64::MAX;

    let resp = client
        .put(format!("{}/customer/{id}/deactivate", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["message"], format!("customer with id: {id} not found"));
}

// ============================================================================
// Loan limits
// ============================================================================

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_set_loan_limit_copies_customer_currency() {
    let client = Client::new();
    let (_, body) = register(&client, &random_national_id()).await;
    let id = body["data"]["id"].as_i64().expect("customer id");

    let resp = client
        .post(format!("{}/customer/{id}/set-loan-limit", base_url()))
        .json(&json!({ "creditLimit": 8000, "availableLimit": 1000, "currency": "USD" }))
        .send()
        .await
        .expect("Failed to set loan limit");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["message"], "Loan limit set successfully");
    assert_eq!(decimal(&body["data"]["creditLimit"]), Decimal::from(8000));
    assert_eq!(decimal(&body["data"]["availableLimit"]), Decimal::from(1000));
    assert_eq!(body["data"]["currency"], "KES");
}

#[tokio::test]
#[ignore = "Requires running service and PostgreSQL"]
async fn test_set_loan_limit_for_unknown_customer() {
    let client = Client::new();

    let resp = client
        .post(format!("{}/customer/{}/set-loan-limit", base_url(), i64::MAX))
        .json(&json!({ "creditLimit": 100, "availableLimit": 50 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["message"], "Loan limit not found for customer");
}

#[tokio::test]
#[ignore = "Requires running service"]
async fn test_readiness() {
    let resp = Client::new()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);
}
