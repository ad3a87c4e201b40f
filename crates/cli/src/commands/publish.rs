//! Broker commands.
//!
//! # Usage
//!
//! ```bash
//! ca-cli publish-adjustment --customer-id 17 --adjustment addition
//! ```
//!
//! # Environment Variables
//!
//! - `AMQP_URL` - Broker connection string
//! - `LOAN_LIMIT_EXCHANGE`, `LOAN_LIMIT_ROUTING_KEY`, `LOAN_LIMIT_QUEUE` - Topology overrides

use thiserror::Error;

use customer_accounts_core::{AdjustmentDirection, CustomerId, LoanLimitAdjustmentEvent};
use customer_accounts_service::config::{BrokerConfig, ConfigError};
use customer_accounts_service::consumer::amqp::{self, ConsumerError};

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Broker(#[from] ConsumerError),
}

/// Publish one adjustment event for `customer_id`.
///
/// # Errors
///
/// Returns `PublishError` if the broker settings are missing or the broker
/// refuses the message.
pub async fn adjustment(
    customer_id: i64,
    direction: AdjustmentDirection,
    loan_id: Option<i64>,
) -> Result<(), PublishError> {
    let config = BrokerConfig::from_env()?;
    let event = LoanLimitAdjustmentEvent::new(CustomerId::new(customer_id), direction, loan_id);

    tracing::info!(
        %customer_id,
        adjustment = %event.adjustment,
        routing_key = %config.routing_key,
        "Publishing loan limit adjustment"
    );
    amqp::publish(&config, &event).await?;
    Ok(())
}
