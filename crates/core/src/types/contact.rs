//! Contact details: email addresses and phone numbers.
//!
//! Both are parse-validated string newtypes; an instance is proof that the
//! value passed validation.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not have a local part and domain separated by @.
    #[error("email must look like user@domain")]
    Malformed,
}

/// An email address.
///
/// Structural validation only: a non-empty local part and domain separated
/// by a single @ within the RFC 5321 length limit. Deliverability is the
/// mail provider's problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 254 characters,
    /// or not of the form `local@domain`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneNumberError {
    /// The input contains a character other than an ASCII digit.
    #[error("phone number may contain digits only")]
    NonDigit,
    /// The input is outside the accepted 10-15 digit range.
    #[error("phone number must be {min}-{max} digits")]
    BadLength {
        /// Minimum number of digits.
        min: usize,
        /// Maximum number of digits.
        max: usize,
    },
}

/// A contact phone number: 10 to 15 ASCII digits, no separators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 10;
    /// Maximum number of digits (E.164 upper bound).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `PhoneNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input contains non-digits or has fewer than
    /// 10 or more than 15 digits.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneNumberError::NonDigit);
        }

        if s.len() < Self::MIN_DIGITS || s.len() > Self::MAX_DIGITS {
            return Err(PhoneNumberError::BadLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name+tag@example.co.uk").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_parse_invalid_emails() {
        assert!(matches!(Email::parse(""), Err(EmailError::Empty)));
        assert!(matches!(
            Email::parse("no-at-symbol"),
            Err(EmailError::Malformed)
        ));
        assert!(matches!(
            Email::parse("@domain.com"),
            Err(EmailError::Malformed)
        ));
        assert!(matches!(Email::parse("user@"), Err(EmailError::Malformed)));

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_email_serde_roundtrip() {
        let email = Email::parse("user@example.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"user@example.com\"");
        let parsed: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, email);
    }

    #[test]
    fn test_parse_valid_phone_numbers() {
        assert!(PhoneNumber::parse("5551234567").is_ok());
        assert!(PhoneNumber::parse("155512345678901").is_ok());
    }

    #[test]
    fn test_parse_invalid_phone_numbers() {
        // Too short / too long
        assert!(matches!(
            PhoneNumber::parse("555123456"),
            Err(PhoneNumberError::BadLength { .. })
        ));
        assert!(matches!(
            PhoneNumber::parse("5551234567890123"),
            Err(PhoneNumberError::BadLength { .. })
        ));
        // Separators are not accepted
        assert!(matches!(
            PhoneNumber::parse("555-123-4567"),
            Err(PhoneNumberError::NonDigit)
        ));
        assert!(matches!(
            PhoneNumber::parse("+15551234567"),
            Err(PhoneNumberError::NonDigit)
        ));
    }

    #[test]
    fn test_phone_display() {
        let phone = PhoneNumber::parse("5551234567").unwrap();
        assert_eq!(phone.to_string(), "5551234567");
    }
}
