//! Event-driven loan limit adjustment.
//!
//! [`LoanLimitAdjuster`] rescales a customer's available limit by the
//! configured percentage. The read-modify-write happens inside a
//! [`LoanLimitStore`], which must perform it as one unit of work so that
//! concurrent adjustments for the same customer serialize.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use customer_accounts_core::{
    AdjustmentDirection, AdjustmentOverflow, AdjustmentPercentage, CustomerId, LimitAdjustment,
};

use crate::db::RepositoryError;

/// Which branch an adjustment took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentOutcome {
    /// The customer has no loan limit record. Nothing was written.
    MissingRecord,
    /// A decrease found no positive balance. Nothing was written.
    Unchanged { current: Option<Decimal> },
    /// The available limit was rewritten.
    Adjusted {
        previous: Option<Decimal>,
        current: Decimal,
    },
}

/// Errors that abort an adjustment without writing.
#[derive(Debug, Error)]
pub enum AdjustmentError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Overflow(#[from] AdjustmentOverflow),
}

impl From<sqlx::Error> for AdjustmentError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Storage for available limits.
pub trait LoanLimitStore: Send + Sync {
    /// Apply `adjustment` to the customer's available limit atomically.
    ///
    /// Implementations read the current value, compute the new one with
    /// [`LimitAdjustment::apply`] and write it back without letting another
    /// adjustment for the same customer interleave.
    fn apply_adjustment(
        &self,
        customer_id: CustomerId,
        adjustment: LimitAdjustment,
    ) -> impl Future<Output = Result<AdjustmentOutcome, AdjustmentError>> + Send;
}

impl<T: LoanLimitStore> LoanLimitStore for Arc<T> {
    fn apply_adjustment(
        &self,
        customer_id: CustomerId,
        adjustment: LimitAdjustment,
    ) -> impl Future<Output = Result<AdjustmentOutcome, AdjustmentError>> + Send {
        (**self).apply_adjustment(customer_id, adjustment)
    }
}

/// Applies percentage adjustments to available limits.
pub struct LoanLimitAdjuster<S> {
    store: S,
    percentage: AdjustmentPercentage,
}

impl<S: LoanLimitStore> LoanLimitAdjuster<S> {
    #[must_use]
    pub const fn new(store: S, percentage: AdjustmentPercentage) -> Self {
        Self { store, percentage }
    }

    /// Increase or decrease the customer's available limit.
    ///
    /// A missing record and a decrease on an empty balance are no-ops, not
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns `AdjustmentError` if the store fails or the arithmetic
    /// overflows. Nothing is written in either case.
    #[instrument(skip(self), fields(percentage = %self.percentage))]
    pub async fn adjust(
        &self,
        customer_id: CustomerId,
        direction: AdjustmentDirection,
    ) -> Result<AdjustmentOutcome, AdjustmentError> {
        let adjustment = LimitAdjustment::new(direction, self.percentage);
        let outcome = self.store.apply_adjustment(customer_id, adjustment).await?;

        match outcome {
            AdjustmentOutcome::MissingRecord => {
                warn!(%customer_id, "No loan limit set for customer");
            }
            AdjustmentOutcome::Unchanged { current } => {
                warn!(%customer_id, ?current, "Loan limit is already at minimum");
            }
            AdjustmentOutcome::Adjusted { previous, current } => {
                info!(
                    %customer_id,
                    %direction,
                    ?previous,
                    new_limit = %current,
                    "Loan limit {} for customer",
                    direction.verb()
                );
            }
        }

        Ok(outcome)
    }
}
