//! Integration tests for Customer Accounts.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and RabbitMQ, then apply migrations
//! cargo run -p customer-accounts-cli -- migrate
//!
//! # Run the ignored tests
//! cargo test -p customer-accounts-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `customer_api` - HTTP API tests against a running service
//! - `loan_limit_adjustment` - Adjuster and consumer tests against the database
//!
//! # Environment Variables
//!
//! - `CUSTOMER_DATABASE_URL` - Test database (falls back to `DATABASE_URL`)
//! - `CUSTOMER_BASE_URL` - Running service (default: `http://localhost:8080`)

use rand::Rng;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;

use customer_accounts_core::{
    CurrencyCode, CustomerId, Email, NationalId, PhoneNumber,
};
use customer_accounts_service::db::{CustomerRepository, LoanLimitRepository};
use customer_accounts_service::models::{LoanLimitUpdate, NewCustomer, NotificationChannels};

/// Base URL of the running service.
#[must_use]
pub fn base_url() -> String {
    std::env::var("CUSTOMER_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Connect to the test database and apply migrations.
///
/// # Panics
///
/// Panics if no database URL is configured or the database is unreachable.
pub async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let url = std::env::var("CUSTOMER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("CUSTOMER_DATABASE_URL or DATABASE_URL must be set");
    let pool = customer_accounts_service::db::create_pool(
        &SecretString::from(url),
        std::time::Duration::from_secs(30),
    )
    .await
    .expect("Failed to connect to test database");

    sqlx::migrate!("../service/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// A national ID no other test run is likely to use.
#[must_use]
pub fn random_national_id() -> String {
    rand::rng().random_range(10_000_000_u32..100_000_000).to_string()
}

/// A registration body that passes validation.
#[must_use]
pub fn registration_body(national_id: &str) -> Value {
    json!({
        "firstName": "Amina",
        "lastName": "Otieno",
        "email": format!("amina.{national_id}@example.com"),
        "phoneNumber": "+254712345678",
        "currency": "KES",
        "nationalId": national_id,
        "income": 1500,
        "customerNotificationPreferencesDto": {
            "smsNotifications": true,
            "emailNotifications": false,
            "pushNotifications": true
        }
    })
}

/// Register a customer directly in the database and give it an available
/// limit.
///
/// # Panics
///
/// Panics if any insert fails.
pub async fn seed_customer(pool: &PgPool, available_limit: Option<Decimal>) -> CustomerId {
    let national_id = random_national_id();
    let new = NewCustomer {
        first_name: "Test".to_string(),
        last_name: "Customer".to_string(),
        email: Email::parse(&format!("test.{national_id}@example.com")).expect("valid email"),
        phone_number: PhoneNumber::parse("+254700000000").expect("valid phone"),
        national_id: NationalId::parse(&national_id).expect("valid national id"),
        income: Decimal::from(2000),
        currency: CurrencyCode::parse("KES").expect("valid currency"),
        notifications: NotificationChannels::default(),
    };

    let details = CustomerRepository::new(pool)
        .register(&new, Decimal::from(5000))
        .await
        .expect("Failed to register test customer");
    let customer_id = details.customer.id;

    match available_limit {
        Some(available) => {
            let mut limit = details.loan_limit.expect("registration creates a loan limit");
            limit.apply_update(
                LoanLimitUpdate {
                    credit_limit: limit.credit_limit,
                    available_limit: available,
                },
                new.currency,
            );
            LoanLimitRepository::new(pool)
                .save(&limit)
                .await
                .expect("Failed to set available limit");
        }
        None => {
            sqlx::query("UPDATE loan_limits SET available_limit = NULL WHERE customer_id = $1")
                .bind(customer_id)
                .execute(pool)
                .await
                .expect("Failed to clear available limit");
        }
    }

    customer_id
}

/// Read a customer's available limit straight from the database.
///
/// # Panics
///
/// Panics if the customer has no loan limit row.
pub async fn available_limit(pool: &PgPool, customer_id: CustomerId) -> Option<Decimal> {
    LoanLimitRepository::new(pool)
        .get_by_customer(customer_id)
        .await
        .expect("Failed to read loan limit")
        .expect("customer has a loan limit")
        .available_limit
}

/// Parse a decimal rendered by the API (a JSON string).
///
/// # Panics
///
/// Panics if the value is not a decimal string or number.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}
