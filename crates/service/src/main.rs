//! Customer Accounts - customer registry and loan limit service.
//!
//! This binary serves the customer API on port 8080 and, in the same
//! process, consumes loan limit adjustment events from the broker.
//!
//! # Architecture
//!
//! - Axum web framework for the JSON API
//! - `PostgreSQL` for customers, loan limits and notification preferences
//! - AMQP consumer that rescales available limits on late/early repayment
//!
//! Migrations are NOT run on startup. Run them explicitly via:
//! `cargo run -p customer-accounts-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use customer_accounts_service::config::{LogFormat, ServiceConfig};
use customer_accounts_service::consumer::{AdjustmentEventHandler, amqp};
use customer_accounts_service::db::{self, PgLoanLimitStore};
use customer_accounts_service::routes;
use customer_accounts_service::services::LoanLimitAdjuster;
use customer_accounts_service::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServiceConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Initialize tracing with `EnvFilter`, the configured format and Sentry.
fn init_tracing(config: &ServiceConfig) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "customer_accounts_service=info,tower_http=debug".into());

    let json = config.log_format == LogFormat::Json;
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = Arc::new(ServiceConfig::from_env().expect("Failed to load configuration"));

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url, config.statement_timeout)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // Start the adjustment consumer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handler = AdjustmentEventHandler::new(LoanLimitAdjuster::new(
        PgLoanLimitStore::new(pool.clone()),
        config.loans.adjustment_percentage,
    ));
    let consumer_config = Arc::clone(&config);
    let consumer = tokio::spawn(async move {
        amqp::run(&consumer_config.broker, &handler, shutdown_rx).await;
    });

    // Build router
    let state = AppState::new(Arc::clone(&config), pool);
    let app = routes::app_router(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("customer accounts listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Stop the consumer once the HTTP server has drained
    let _ = shutdown_tx.send(true);
    if let Err(e) = consumer.await {
        tracing::error!(error = %e, "Loan limit consumer task panicked");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
