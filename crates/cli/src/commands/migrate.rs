//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! ca-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CUSTOMER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/service/migrations/` and are embedded at
//! compile time.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the customer accounts migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CUSTOMER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("CUSTOMER_DATABASE_URL"))?;

    tracing::info!("Connecting to customer accounts database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running customer accounts migrations...");
    sqlx::migrate!("../service/migrations").run(&pool).await?;

    tracing::info!("Customer accounts migrations complete!");
    Ok(())
}
