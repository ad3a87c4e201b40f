//! Customer Accounts Core - Shared domain types.
//!
//! This crate provides the types shared by every Customer Accounts component:
//! - `service` - HTTP API and loan-limit event consumer
//! - `cli` - Command-line tools for migrations and broker operations
//! - `integration-tests` - End-to-end tests against a running stack
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no broker clients. The loan-limit adjustment arithmetic lives here
//! so it can be exercised without a database.
//!
//! # Modules
//!
//! - [`types`] - Validated newtypes for IDs, contact details, currency and status
//! - [`adjustment`] - The percentage-based available-limit adjustment rule
//! - [`events`] - The queue payload that requests an adjustment

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod adjustment;
pub mod events;
pub mod types;

pub use adjustment::{AdjustmentDirection, AdjustmentOverflow, AdjustmentPercentage, LimitAdjustment};
pub use events::{EventError, LoanLimitAdjustmentEvent};
pub use types::*;
