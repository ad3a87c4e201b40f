//! Percentage-based adjustment of a customer's available loan limit.
//!
//! An adjustment event either raises or lowers the available limit by a fixed,
//! configured percentage of its current value. The rule is pure; persisting
//! the result atomically is the caller's job.
//!
//! # Rule
//!
//! | current         | increase              | decrease                        |
//! |-----------------|-----------------------|---------------------------------|
//! | unset           | `0`                   | no-op                           |
//! | `<= 0`          | `c + c * p / 100`     | no-op                           |
//! | `> 0`           | `c + c * p / 100`     | `max(0, c - c * p / 100)`       |
//!
//! Arithmetic is exact decimal arithmetic; the result is rounded half away
//! from zero to [`MONEY_SCALE`] places, matching the `NUMERIC(19, 2)` column
//! it is stored in.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits kept for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Which way an adjustment moves the available limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

impl AdjustmentDirection {
    /// Map a queue keyword (`addition` / `subtraction`, any case) to a direction.
    ///
    /// Unknown keywords yield `None`.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        if keyword.eq_ignore_ascii_case("addition") {
            Some(Self::Increase)
        } else if keyword.eq_ignore_ascii_case("subtraction") {
            Some(Self::Decrease)
        } else {
            None
        }
    }

    /// The queue keyword for this direction.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Increase => "addition",
            Self::Decrease => "subtraction",
        }
    }

    /// Past-tense verb used in log lines.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Increase => "increased",
            Self::Decrease => "reduced",
        }
    }
}

impl fmt::Display for AdjustmentDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Whole-number percentage applied by every adjustment.
///
/// Values above 100 are allowed; a decrease then clamps at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjustmentPercentage(u32);

impl AdjustmentPercentage {
    #[must_use]
    pub const fn new(percent: u32) -> Self {
        Self(percent)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    fn as_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl fmt::Display for AdjustmentPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// The computed limit does not fit in a `Decimal`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("loan limit adjustment overflowed the decimal range")]
pub struct AdjustmentOverflow;

/// A single requested adjustment: a direction plus the configured percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitAdjustment {
    pub direction: AdjustmentDirection,
    pub percentage: AdjustmentPercentage,
}

impl LimitAdjustment {
    #[must_use]
    pub const fn new(direction: AdjustmentDirection, percentage: AdjustmentPercentage) -> Self {
        Self {
            direction,
            percentage,
        }
    }

    /// Compute the new available limit from the current one.
    ///
    /// Returns `Ok(None)` when the adjustment is a no-op and nothing should be
    /// written: a decrease against an unset, zero or negative balance.
    ///
    /// # Errors
    ///
    /// Returns [`AdjustmentOverflow`] if the intermediate product or the result
    /// leaves the `Decimal` range.
    pub fn apply(&self, current: Option<Decimal>) -> Result<Option<Decimal>, AdjustmentOverflow> {
        let base = match (self.direction, current) {
            (AdjustmentDirection::Decrease, None) => return Ok(None),
            (AdjustmentDirection::Decrease, Some(limit)) if limit <= Decimal::ZERO => {
                return Ok(None);
            }
            (AdjustmentDirection::Increase, None) => Decimal::ZERO,
            (_, Some(limit)) => limit,
        };

        let delta = base
            .checked_mul(self.percentage.as_decimal())
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .ok_or(AdjustmentOverflow)?;

        let next = match self.direction {
            AdjustmentDirection::Increase => base.checked_add(delta),
            AdjustmentDirection::Decrease => base
                .checked_sub(delta)
                .map(|limit| limit.max(Decimal::ZERO)),
        }
        .ok_or(AdjustmentOverflow)?;

        Ok(Some(next.round_dp_with_strategy(
            MONEY_SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }
}
