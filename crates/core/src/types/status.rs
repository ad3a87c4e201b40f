//! Customer lifecycle status.
//!
//! Customers are never deleted; they are toggled between active and
//! inactive. The flag is stored and exchanged as the integers `1` and `0`.

use serde::{Deserialize, Serialize};

/// Whether a customer account is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum CustomerStatus {
    /// Stored as `0`.
    Inactive,
    /// Stored as `1`.
    Active,
}

impl CustomerStatus {
    /// The stored integer flag.
    #[must_use]
    pub const fn as_flag(self) -> i32 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    /// Parse a stored flag. Only `0` and `1` are valid.
    #[must_use]
    pub const fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            0 => Some(Self::Inactive),
            1 => Some(Self::Active),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl TryFrom<i32> for CustomerStatus {
    type Error = String;

    fn try_from(flag: i32) -> Result<Self, Self::Error> {
        Self::from_flag(flag).ok_or_else(|| format!("active flag must be 0 or 1, got {flag}"))
    }
}

impl From<CustomerStatus> for i32 {
    fn from(status: CustomerStatus) -> Self {
        status.as_flag()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CustomerStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CustomerStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let flag = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(flag)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CustomerStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_flag(), buf)
    }
}
