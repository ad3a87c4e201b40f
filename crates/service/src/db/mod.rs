//! Database operations for the customer accounts `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `customers` - Aggregate root, soft-deactivated via the `active` flag
//! - `loan_limits` - One row per customer, holds credit and available limits
//! - `notification_preferences` - One row per customer, SMS/email/push toggles
//!
//! # Migrations
//!
//! Migrations are stored in `crates/service/migrations/` and run via:
//! ```bash
//! cargo run -p customer-accounts-cli -- migrate
//! ```

pub mod customers;
pub mod loan_limits;
pub mod pagination;
pub mod preferences;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

pub use customers::{CustomerFilter, CustomerRepository};
pub use loan_limits::{LoanLimitRepository, PgLoanLimitStore};
pub use pagination::{Page, PageRequest};
pub use preferences::NotificationPreferencesRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate active national ID).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// Every connection runs with `statement_timeout` and `lock_timeout` set to
/// `statement_timeout`, so a stalled row lock surfaces as an error.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `statement_timeout` - Upper bound for a single statement or lock wait
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    statement_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options(database_url, statement_timeout)?)
        .await
}

/// Build connection options carrying the session timeouts.
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` if the URL cannot be parsed.
pub fn connect_options(
    database_url: &secrecy::SecretString,
    statement_timeout: Duration,
) -> Result<PgConnectOptions, sqlx::Error> {
    let millis = statement_timeout.as_millis().to_string();
    let options = database_url
        .expose_secret()
        .parse::<PgConnectOptions>()?
        .options([
            ("statement_timeout", millis.as_str()),
            ("lock_timeout", millis.as_str()),
        ]);
    Ok(options)
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(message: &str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(message.to_owned());
        }
        RepositoryError::Database(e)
    }
}
