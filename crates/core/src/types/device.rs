//! Location device identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`DeviceIdentifier`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdentifierError {
    /// The input string is empty or whitespace only.
    #[error("device identifier cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("device identifier must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The identifier a location device advertises (an iBeacon proximity UUID).
///
/// Identifiers are compared case-insensitively, so the parsed value is
/// normalized to lowercase with surrounding whitespace removed.
///
/// ## Examples
///
/// ```
/// use proximity_core::DeviceIdentifier;
///
/// let id = DeviceIdentifier::parse(" 11111111-AAAA-1111-1111-111111111111 ").unwrap();
/// assert_eq!(id.as_str(), "11111111-aaaa-1111-1111-111111111111");
///
/// assert!(DeviceIdentifier::parse("").is_err());
/// assert!(DeviceIdentifier::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceIdentifier(String);

impl DeviceIdentifier {
    /// Maximum length of a device identifier.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a device identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or too long.
    pub fn parse(input: &str) -> Result<Self, DeviceIdentifierError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DeviceIdentifierError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(DeviceIdentifierError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceIdentifier {
    type Error = DeviceIdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceIdentifier> for String {
    fn from(id: DeviceIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let a = DeviceIdentifier::parse("ABC-def").unwrap();
        let b = DeviceIdentifier::parse("abc-DEF").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let input = "a".repeat(DeviceIdentifier::MAX_LENGTH + 1);
        assert_eq!(
            DeviceIdentifier::parse(&input),
            Err(DeviceIdentifierError::TooLong {
                max: DeviceIdentifier::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let result: Result<DeviceIdentifier, _> = serde_json::from_str(r#""  ""#);
        assert!(result.is_err());
    }
}
