//! Domain models for the customer accounts service.

pub mod customer;
pub mod loan_limit;
pub mod preferences;

pub use customer::{Customer, CustomerDetails, NewCustomer};
pub use loan_limit::{LoanLimit, LoanLimitUpdate};
pub use preferences::{NotificationChannels, NotificationPreferences};
