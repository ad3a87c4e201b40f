//! AMQP transport for adjustment events.
//!
//! The consumer declares a durable direct exchange and a durable queue bound
//! to it, then acks every delivery after the handler returns. Broker
//! failures are logged and the consumer reconnects after
//! [`RECONNECT_DELAY`] until shutdown is signalled.

use std::time::Duration;

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use customer_accounts_core::{EventError, LoanLimitAdjustmentEvent};

use super::AdjustmentEventHandler;
use crate::config::BrokerConfig;
use crate::services::LoanLimitStore;

/// Wait between a broker failure and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Deliveries in flight per consumer. Events for a customer are applied in
/// queue order.
const PREFETCH: u16 = 1;

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// Errors talking to the broker.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    #[error(transparent)]
    Event(#[from] EventError),
}

/// Open a connection to the configured broker.
///
/// # Errors
///
/// Returns `ConsumerError::Broker` if the broker is unreachable or rejects
/// the credentials.
pub async fn connect(config: &BrokerConfig) -> Result<Connection, ConsumerError> {
    let connection =
        Connection::connect(config.url.expose_secret(), ConnectionProperties::default()).await?;
    Ok(connection)
}

/// Declare the exchange and queue and bind them with the routing key.
///
/// Declarations are idempotent, so producers and consumers both call this.
///
/// # Errors
///
/// Returns `ConsumerError::Broker` if a declaration is refused, for example
/// because an existing exchange has a different type.
pub async fn declare_topology(channel: &Channel, config: &BrokerConfig) -> Result<(), ConsumerError> {
    channel
        .exchange_declare(
            &config.exchange,
            ExchangeKind::Direct,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_declare(
            &config.queue,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_bind(
            &config.queue,
            &config.exchange,
            &config.routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    Ok(())
}

/// Publish one adjustment event and wait for the broker to accept it.
///
/// # Errors
///
/// Returns `ConsumerError` if the event cannot be encoded or the broker
/// refuses it.
pub async fn publish(
    config: &BrokerConfig,
    event: &LoanLimitAdjustmentEvent,
) -> Result<(), ConsumerError> {
    let payload = event.to_vec()?;

    let connection = connect(config).await?;
    let channel = connection.create_channel().await?;
    declare_topology(&channel, config).await?;

    channel
        .basic_publish(
            &config.exchange,
            &config.routing_key,
            BasicPublishOptions::default(),
            &payload,
            BasicProperties::default()
                .with_content_type("application/json".into())
                .with_delivery_mode(PERSISTENT),
        )
        .await?
        .await?;

    info!(
        customer_id = %event.customer_id,
        adjustment = %event.adjustment,
        exchange = %config.exchange,
        "Published loan limit adjustment event"
    );

    connection.close(200, "OK").await?;
    Ok(())
}

/// Consume adjustment events until `shutdown` flips to `true` or its sender
/// is dropped.
///
/// An in-flight message whose handling is interrupted by shutdown is not
/// acked and will be redelivered.
pub async fn run<S: LoanLimitStore>(
    config: &BrokerConfig,
    handler: &AdjustmentEventHandler<S>,
    mut shutdown: watch::Receiver<bool>,
) {
    while !*shutdown.borrow() {
        tokio::select! {
            result = consume(config, handler) => match result {
                Ok(()) => warn!(queue = %config.queue, "Broker closed the consumer stream"),
                Err(e) => error!(error = %e, queue = %config.queue, "Loan limit consumer failed"),
            },
            _ = shutdown.changed() => break,
        }

        info!(delay_secs = RECONNECT_DELAY.as_secs(), "Reconnecting to broker");
        tokio::select! {
            () = tokio::time::sleep(RECONNECT_DELAY) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!("Loan limit consumer stopped");
}

async fn consume<S: LoanLimitStore>(
    config: &BrokerConfig,
    handler: &AdjustmentEventHandler<S>,
) -> Result<(), ConsumerError> {
    let connection = connect(config).await?;
    let channel = connection.create_channel().await?;
    declare_topology(&channel, config).await?;
    channel
        .basic_qos(PREFETCH, BasicQosOptions::default())
        .await?;

    let mut deliveries = channel
        .basic_consume(
            &config.queue,
            &config.consumer_tag,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;

    info!(queue = %config.queue, "Listening for loan limit adjustment events");

    while let Some(delivery) = deliveries.next().await {
        let delivery = delivery?;
        let outcome = handler.handle(&delivery.data).await;
        debug!(?outcome, delivery_tag = delivery.delivery_tag, "Adjustment event handled");
        delivery.ack(BasicAckOptions::default()).await?;
    }

    Ok(())
}
