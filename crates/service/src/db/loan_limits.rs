//! Loan limit repository and the transactional adjustment store.

use sqlx::PgPool;

use customer_accounts_core::{CustomerId, LimitAdjustment, LoanLimitId};

use super::RepositoryError;
use crate::models::LoanLimit;
use crate::services::loan_limits::{AdjustmentError, AdjustmentOutcome, LoanLimitStore};

/// Repository for loan limit database operations.
pub struct LoanLimitRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LoanLimitRepository<'a> {
    /// Create a new loan limit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the loan limit belonging to a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<LoanLimit>, RepositoryError> {
        let limit = sqlx::query_as::<_, LoanLimit>(
            r"
            SELECT id, customer_id, credit_limit, available_limit, currency,
                   date_created, date_modified
            FROM loan_limits
            WHERE customer_id = $1
            ",
        )
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(limit)
    }

    /// Persist the limits and currency of an existing record.
    ///
    /// Returns the stored record with its refreshed modification time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record no longer exists.
    /// Returns `RepositoryError::Database` for other database errors
    /// (including a negative available limit rejected by the check constraint).
    pub async fn save(&self, limit: &LoanLimit) -> Result<LoanLimit, RepositoryError> {
        sqlx::query_as::<_, LoanLimit>(
            r"
            UPDATE loan_limits
            SET credit_limit = $2,
                available_limit = $3,
                currency = $4,
                date_modified = NOW()
            WHERE id = $1
            RETURNING id, customer_id, credit_limit, available_limit, currency,
                      date_created, date_modified
            ",
        )
        .bind(limit.id)
        .bind(limit.credit_limit)
        .bind(limit.available_limit)
        .bind(limit.currency)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

/// [`LoanLimitStore`] backed by `PostgreSQL`.
///
/// Each adjustment locks the customer's row with `SELECT ... FOR UPDATE`
/// and writes the new value in the same transaction.
#[derive(Debug, Clone)]
pub struct PgLoanLimitStore {
    pool: PgPool,
}

impl PgLoanLimitStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LoanLimitStore for PgLoanLimitStore {
    async fn apply_adjustment(
        &self,
        customer_id: CustomerId,
        adjustment: LimitAdjustment,
    ) -> Result<AdjustmentOutcome, AdjustmentError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, (LoanLimitId, Option<rust_decimal::Decimal>)>(
            r"
            SELECT id, available_limit
            FROM loan_limits
            WHERE customer_id = $1
            FOR UPDATE
            ",
        )
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping `tx` on the early returns rolls back and releases the lock.
        let Some((id, previous)) = row else {
            return Ok(AdjustmentOutcome::MissingRecord);
        };
        let Some(current) = adjustment.apply(previous)? else {
            return Ok(AdjustmentOutcome::Unchanged { current: previous });
        };

        sqlx::query(
            r"
            UPDATE loan_limits
            SET available_limit = $2, date_modified = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(current)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AdjustmentOutcome::Adjusted { previous, current })
    }
}
