//! Customer contact and identity fields.
//!
//! Each type is parsed once at the API boundary and carried as a validated
//! value afterwards. Values read back from the database are trusted.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a contact field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input is empty or whitespace only.
    #[error("{field} cannot be blank")]
    Blank {
        /// Human-readable field name.
        field: &'static str,
    },
    /// The input is not a plausible email address.
    #[error("Invalid email format")]
    InvalidEmail,
    /// The input does not match the accepted phone number shape.
    #[error("Invalid phone number format")]
    InvalidPhoneNumber,
    /// The input is not 6-10 digits.
    #[error("National ID must be between 6 and 10 digits")]
    InvalidNationalId,
}

/// Implements the shared string-newtype plumbing (accessors, `Display`,
/// `FromStr`, and the `postgres` TEXT mapping).
macro_rules! text_newtype {
    ($name:ident) => {
        impl $name {
            /// Returns the value as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the value and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ContactError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <String as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

/// An email address.
///
/// ## Constraints
///
/// - 1-254 characters (RFC 5321 limit), no whitespace
/// - Exactly one @ symbol with a non-empty local part and domain
///
/// ```
/// use customer_accounts_core::Email;
///
/// assert!(Email::parse("jane.doe@example.com").is_ok());
/// assert!(Email::parse("jane doe@example.com").is_err());
/// assert!(Email::parse("a@b@c").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Blank` for empty input and
    /// `ContactError::InvalidEmail` when the shape is wrong.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Blank { field: "Email" });
        }
        if s.len() > Self::MAX_LENGTH || s.chars().any(char::is_whitespace) {
            return Err(ContactError::InvalidEmail);
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_owned()))
            }
            _ => Err(ContactError::InvalidEmail),
        }
    }
}

text_newtype!(Email);

/// A phone number: an optional `+` and 1-3 digit country code, followed by a
/// 10-digit subscriber number.
///
/// ```
/// use customer_accounts_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("+254712345671").is_ok());
/// assert!(PhoneNumber::parse("0712345671").is_ok());
/// assert!(PhoneNumber::parse("+0712345671").is_err()); // `+` needs a country code
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const SUBSCRIBER_DIGITS: usize = 10;
    const MAX_COUNTRY_CODE_DIGITS: usize = 3;

    /// Parse a `PhoneNumber`.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Blank` for empty input and
    /// `ContactError::InvalidPhoneNumber` when the shape is wrong.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Blank {
                field: "Phone number",
            });
        }

        let (has_plus, digits) = s
            .strip_prefix('+')
            .map_or((false, s), |rest| (true, rest));

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ContactError::InvalidPhoneNumber);
        }

        let min = if has_plus {
            Self::SUBSCRIBER_DIGITS + 1
        } else {
            Self::SUBSCRIBER_DIGITS
        };
        let max = Self::SUBSCRIBER_DIGITS + Self::MAX_COUNTRY_CODE_DIGITS;

        if (min..=max).contains(&digits.len()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(ContactError::InvalidPhoneNumber)
        }
    }
}

text_newtype!(PhoneNumber);

/// A national identification number (6-10 digits).
///
/// ```
/// use customer_accounts_core::NationalId;
///
/// assert!(NationalId::parse("4234159").is_ok());
/// assert!(NationalId::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NationalId(String);

impl NationalId {
    /// Parse a `NationalId`.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Blank` for empty input and
    /// `ContactError::InvalidNationalId` unless the input is 6-10 ASCII digits.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Blank {
                field: "national Id number",
            });
        }
        if (6..=10).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(ContactError::InvalidNationalId)
        }
    }
}

text_newtype!(NationalId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_accepts_common_shapes() {
        assert!(Email::parse("john.doe@example.com").is_ok());
        assert!(Email::parse("user+tag@sub.example.co.ke").is_ok());
        assert!(Email::parse("a@b").is_ok());
    }

    #[test]
    fn test_email_trims_input() {
        let email = Email::parse("  john@example.com ").unwrap();
        assert_eq!(email.as_str(), "john@example.com");
    }

    #[test]
    fn test_email_rejects_bad_shapes() {
        assert_eq!(
            Email::parse("   "),
            Err(ContactError::Blank { field: "Email" })
        );
        assert_eq!(Email::parse("no-at"), Err(ContactError::InvalidEmail));
        assert_eq!(Email::parse("@example.com"), Err(ContactError::InvalidEmail));
        assert_eq!(Email::parse("user@"), Err(ContactError::InvalidEmail));
        assert_eq!(Email::parse("a@b@c"), Err(ContactError::InvalidEmail));
        assert_eq!(
            Email::parse("jo hn@example.com"),
            Err(ContactError::InvalidEmail)
        );
    }

    #[test]
    fn test_phone_number_lengths() {
        // 10 digits, no country code
        assert!(PhoneNumber::parse("0712345671").is_ok());
        // country code without plus
        assert!(PhoneNumber::parse("254712345671").is_ok());
        // plus with 1-3 digit country code
        assert!(PhoneNumber::parse("+17123456710").is_ok());
        assert!(PhoneNumber::parse("+254712345671").is_ok());
        // too short / too long
        assert!(PhoneNumber::parse("071234567").is_err());
        assert!(PhoneNumber::parse("+25471234567100").is_err());
        // plus alone is not a country code
        assert!(PhoneNumber::parse("+0712345671").is_err());
    }

    #[test]
    fn test_phone_number_rejects_separators() {
        assert_eq!(
            PhoneNumber::parse("071-234-5671"),
            Err(ContactError::InvalidPhoneNumber)
        );
        assert_eq!(
            PhoneNumber::parse("++254712345671"),
            Err(ContactError::InvalidPhoneNumber)
        );
    }

    #[test]
    fn test_national_id_bounds() {
        assert!(NationalId::parse("123456").is_ok());
        assert!(NationalId::parse("1234567890").is_ok());
        assert_eq!(
            NationalId::parse("12345"),
            Err(ContactError::InvalidNationalId)
        );
        assert_eq!(
            NationalId::parse("12345678901"),
            Err(ContactError::InvalidNationalId)
        );
        assert_eq!(
            NationalId::parse("12a4567"),
            Err(ContactError::InvalidNationalId)
        );
    }

    #[test]
    fn test_error_messages_are_client_facing() {
        assert_eq!(
            ContactError::InvalidNationalId.to_string(),
            "National ID must be between 6 and 10 digits"
        );
        assert_eq!(
            ContactError::Blank {
                field: "Phone number"
            }
            .to_string(),
            "Phone number cannot be blank"
        );
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = NationalId::parse("4234159").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"4234159\"");
    }
}
