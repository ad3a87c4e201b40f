//! ISO 4217 currency code.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a currency code is malformed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The input is empty or whitespace only.
    #[error("Currency cannot be empty")]
    Empty,
    /// The input is not three uppercase ASCII letters.
    #[error("Currency must be a valid 3-letter ISO code (e.g., USD, KES)")]
    InvalidCode,
}

/// A three-letter uppercase currency code such as `KES` or `USD`.
///
/// Only the shape is checked; the code is not looked up in the ISO table.
///
/// ```
/// use customer_accounts_core::CurrencyCode;
///
/// assert_eq!(CurrencyCode::parse("KES").unwrap().as_str(), "KES");
/// assert!(CurrencyCode::parse("kes").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Parse a `CurrencyCode`.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::Empty` for blank input and
    /// `CurrencyError::InvalidCode` unless the input is exactly three
    /// uppercase ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        if s.trim().is_empty() {
            return Err(CurrencyError::Empty);
        }
        match s.as_bytes() {
            &[a, b, c] if [a, b, c].iter().all(u8::is_ascii_uppercase) => Ok(Self([a, b, c])),
            _ => Err(CurrencyError::InvalidCode),
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only uppercase ASCII bytes are ever stored.
        core::str::from_utf8(&self.0).unwrap_or("XXX")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_owned()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CurrencyCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CurrencyCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(s.trim())?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CurrencyCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
