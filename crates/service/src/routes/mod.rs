//! HTTP route handlers for the customer API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness probe
//! GET  /health/ready                         - Readiness probe (database)
//!
//! # Customers
//! POST /customer                             - Register a customer
//! GET  /customer                             - Filtered, paginated listing
//! PUT  /customer/{id}/deactivate             - Deactivate a customer
//! POST /customer/{customerId}/set-loan-limit - Overwrite credit/available limits
//! ```

pub mod customers;
pub mod extract;
pub mod health;

use std::time::Duration;

use axum::http::{Request, Response};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customer",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route("/customer/{id}/deactivate", put(customers::deactivate_customer))
        .route(
            "/customer/{customer_id}/set-loan-limit",
            post(customers::set_loan_limit),
        )
}

/// Build the complete application router with request tracing.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(customer_routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}
