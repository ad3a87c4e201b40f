//! Loan limit records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use customer_accounts_core::{CurrencyCode, CustomerId, LoanLimitId};

/// A customer's loan allowance.
///
/// `available_limit` is the balance rescaled by adjustment events and is
/// never negative. `credit_limit` is not used as an upper bound.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LoanLimit {
    pub id: LoanLimitId,
    pub customer_id: CustomerId,
    pub credit_limit: Decimal,
    pub available_limit: Option<Decimal>,
    pub currency: CurrencyCode,
    pub date_created: DateTime<Utc>,
    pub date_modified: Option<DateTime<Utc>>,
}

/// Values written by an administrative limit change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanLimitUpdate {
    pub credit_limit: Decimal,
    pub available_limit: Decimal,
}

impl LoanLimit {
    /// Overwrite both limits, taking the currency from the owning customer.
    pub fn apply_update(&mut self, update: LoanLimitUpdate, currency: CurrencyCode) {
        self.credit_limit = update.credit_limit;
        self.available_limit = Some(update.available_limit);
        self.currency = currency;
    }
}
