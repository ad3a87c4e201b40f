//! The customer aggregate root.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use customer_accounts_core::{
    CurrencyCode, CustomerId, CustomerStatus, Email, NationalId, PhoneNumber,
};

use super::{LoanLimit, NotificationChannels, NotificationPreferences};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: PhoneNumber,
    pub national_id: NationalId,
    pub income: Decimal,
    pub currency: CurrencyCode,
    #[sqlx(rename = "active")]
    pub status: CustomerStatus,
    pub date_created: DateTime<Utc>,
    pub date_modified: Option<DateTime<Utc>>,
}

impl Customer {
    /// Mark the customer inactive and touch the modification timestamp.
    ///
    /// Returns `false` without changing anything if the customer was
    /// already inactive.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.status = CustomerStatus::Inactive;
        self.date_modified = Some(now);
        true
    }
}

/// A validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: PhoneNumber,
    pub national_id: NationalId,
    pub income: Decimal,
    pub currency: CurrencyCode,
    pub notifications: NotificationChannels,
}

/// A customer together with its loan limit and notification preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub customer: Customer,
    pub loan_limit: Option<LoanLimit>,
    pub preferences: Option<NotificationPreferences>,
}
