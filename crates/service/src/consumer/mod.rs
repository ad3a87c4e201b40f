//! Loan limit adjustment events.
//!
//! [`AdjustmentEventHandler`] turns a raw queue payload into an adjustment.
//! It never fails: malformed payloads, unknown directions and adjuster
//! errors are logged and reported as an [`EventOutcome`], and the message is
//! considered handled. [`amqp`] feeds it from the broker.

pub mod amqp;

use tracing::{error, info, warn};

use customer_accounts_core::LoanLimitAdjustmentEvent;

use crate::services::{AdjustmentOutcome, LoanLimitAdjuster, LoanLimitStore};

/// What handling one message amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The adjuster ran (possibly as a no-op).
    Applied(AdjustmentOutcome),
    /// The `adjustment` keyword was neither `addition` nor `subtraction`.
    UnknownAdjustment(String),
    /// The payload could not be parsed.
    Malformed,
    /// The adjuster failed; nothing was written.
    Failed,
}

/// Parses adjustment events and dispatches them to a [`LoanLimitAdjuster`].
pub struct AdjustmentEventHandler<S> {
    adjuster: LoanLimitAdjuster<S>,
}

impl<S: LoanLimitStore> AdjustmentEventHandler<S> {
    #[must_use]
    pub const fn new(adjuster: LoanLimitAdjuster<S>) -> Self {
        Self { adjuster }
    }

    /// Handle one message body.
    pub async fn handle(&self, payload: &[u8]) -> EventOutcome {
        let event = match LoanLimitAdjustmentEvent::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "Error processing loan adjustment event");
                return EventOutcome::Malformed;
            }
        };

        info!(
            customer_id = %event.customer_id,
            adjustment = %event.adjustment,
            loan_id = ?event.loan_id,
            "Received message to adjust loan limit"
        );

        let Some(direction) = event.direction() else {
            warn!(
                customer_id = %event.customer_id,
                adjustment = %event.adjustment,
                "Ignoring unknown loan limit adjustment"
            );
            return EventOutcome::UnknownAdjustment(event.adjustment);
        };

        match self.adjuster.adjust(event.customer_id, direction).await {
            Ok(outcome) => EventOutcome::Applied(outcome),
            Err(e) => {
                error!(
                    customer_id = %event.customer_id,
                    error = %e,
                    "Error processing loan adjustment event"
                );
                EventOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use customer_accounts_core::{AdjustmentPercentage, CustomerId};

    use super::*;
    use crate::services::loan_limits::testing::MemoryLoanLimitStore;

    const CUSTOMER: CustomerId = CustomerId::new(12);

    fn handler(limit: &str) -> (AdjustmentEventHandler<Arc<MemoryLoanLimitStore>>, Arc<MemoryLoanLimitStore>) {
        let store = Arc::new(MemoryLoanLimitStore::with_limit(
            CUSTOMER,
            Some(limit.parse().unwrap()),
        ));
        let adjuster = LoanLimitAdjuster::new(Arc::clone(&store), AdjustmentPercentage::new(10));
        (AdjustmentEventHandler::new(adjuster), store)
    }

    #[tokio::test]
    async fn test_subtraction_then_addition() {
        let (handler, store) = handler("1000");

        let outcome = handler
            .handle(br#"{"customerId": 12, "adjustment": "subtraction", "loanId": 3}"#)
            .await;
        assert!(matches!(outcome, EventOutcome::Applied(AdjustmentOutcome::Adjusted { .. })));
        assert_eq!(store.limit(CUSTOMER).await, Some(Some(Decimal::from(900))));

        handler
            .handle(br#"{"customerId": 12, "adjustment": "ADDITION"}"#)
            .await;
        assert_eq!(store.limit(CUSTOMER).await, Some(Some(Decimal::from(990))));
    }

    #[tokio::test]
    async fn test_missing_customer_id_is_consumed_without_change() {
        let (handler, store) = handler("1000");

        let outcome = handler.handle(br#"{"adjustment": "subtraction"}"#).await;

        assert_eq!(outcome, EventOutcome::Malformed);
        assert_eq!(store.writes(), 0);
        assert_eq!(store.limit(CUSTOMER).await, Some(Some(Decimal::from(1000))));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_consumed() {
        let (handler, store) = handler("1000");

        assert_eq!(handler.handle(b"not json at all").await, EventOutcome::Malformed);
        assert_eq!(handler.handle(b"").await, EventOutcome::Malformed);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_unknown_adjustment_is_ignored() {
        let (handler, store) = handler("1000");

        let outcome = handler
            .handle(br#"{"customerId": 12, "adjustment": "multiplication"}"#)
            .await;

        assert_eq!(
            outcome,
            EventOutcome::UnknownAdjustment("multiplication".to_string())
        );
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_a_noop() {
        let (handler, store) = handler("1000");

        let outcome = handler
            .handle(br#"{"customerId": 404, "adjustment": "addition"}"#)
            .await;

        assert_eq!(outcome, EventOutcome::Applied(AdjustmentOutcome::MissingRecord));
        assert_eq!(store.writes(), 0);
    }
}
