//! Core types for Customer Accounts.
//!
//! This module provides type-safe wrappers for the customer aggregate's fields.

pub mod contact;
pub mod currency;
pub mod id;
pub mod status;

pub use contact::{ContactError, Email, NationalId, PhoneNumber};
pub use currency::{CurrencyCode, CurrencyError};
pub use id::*;
pub use status::CustomerStatus;
