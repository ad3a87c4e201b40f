//! Loan-limit adjustment events exchanged over the message broker.
//!
//! Producers (the loan service, or `ca-cli publish-adjustment`) send one JSON
//! object per message:
//!
//! ```json
//! { "customerId": 17, "adjustment": "subtraction", "loanId": 301 }
//! ```
//!
//! `loanId` is informational and ignored by the adjuster.

use serde::{Deserialize, Serialize};

use crate::adjustment::AdjustmentDirection;
use crate::types::CustomerId;

/// Errors raised while decoding an event payload.
#[derive(thiserror::Error, Debug)]
pub enum EventError {
    /// The payload is not valid JSON or lacks a required field.
    #[error("malformed adjustment event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A request to rescale a customer's available loan limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanLimitAdjustmentEvent {
    /// Customer whose limit is adjusted.
    pub customer_id: CustomerId,
    /// `addition` or `subtraction` (case-insensitive). Anything else is ignored.
    pub adjustment: String,
    /// Loan that triggered the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<i64>,
}

impl LoanLimitAdjustmentEvent {
    /// Build an event for a known direction.
    #[must_use]
    pub fn new(
        customer_id: CustomerId,
        direction: AdjustmentDirection,
        loan_id: Option<i64>,
    ) -> Self {
        Self {
            customer_id,
            adjustment: direction.keyword().to_owned(),
            loan_id,
        }
    }

    /// Decode a raw message body.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Malformed` if the body is not a JSON object with an
    /// integer `customerId` and a string `adjustment`.
    pub fn from_slice(payload: &[u8]) -> Result<Self, EventError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encode the event as a message body.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Malformed` if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, EventError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// The requested direction, or `None` for an unrecognised keyword.
    #[must_use]
    pub fn direction(&self) -> Option<AdjustmentDirection> {
        AdjustmentDirection::from_keyword(&self.adjustment)
    }
}
