//! Business logic behind the HTTP routes and the event consumer.

pub mod customers;
pub mod loan_limits;

pub use customers::{CustomerService, DeactivationOutcome};
pub use loan_limits::{
    AdjustmentError, AdjustmentOutcome, LoanLimitAdjuster, LoanLimitStore,
};
