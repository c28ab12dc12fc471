//! E.164 phone number value object

use serde::{Deserialize, Serialize};
use std::fmt;

use pv_shared::utils::phone::{digits_only, mask_phone_number, normalize_e164};

use crate::errors::DomainError;

/// A phone number in canonical E.164 form (`+` followed by 7 to 15 digits)
///
/// Construction always normalizes, so two `PhoneNumber`s that compare equal
/// address the same subscriber and produce the same storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize and validate a raw phone number
    ///
    /// Formatting characters are stripped and a leading `00` becomes `+`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        normalize_e164(raw)
            .map(PhoneNumber)
            .ok_or_else(|| DomainError::Validation {
                message: "Phone number must be in E.164 format".to_string(),
            })
    }

    /// Canonical E.164 representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits without the leading `+`, as SMS providers expect
    pub fn digits(&self) -> String {
        digits_only(&self.0)
    }

    /// Masked form for logs
    pub fn masked(&self) -> String {
        mask_phone_number(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let phone = PhoneNumber::parse("+90 555 123 45 67").unwrap();
        assert_eq!(phone.as_str(), "+905551234567");
        assert_eq!(phone.digits(), "905551234567");
        assert_eq!(phone.masked(), "+********4567");

        let same = PhoneNumber::parse("0090-555-123-4567").unwrap();
        assert_eq!(phone, same);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(matches!(
            PhoneNumber::parse("5551234567"),
            Err(DomainError::Validation { .. })
        ));
        assert!(PhoneNumber::parse("+abc").is_err());
        assert!(PhoneNumber::parse("+90555abc1234567").is_err());
        assert!(PhoneNumber::parse("").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let phone: PhoneNumber = serde_json::from_str("\"+14155552671\"").unwrap();
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+14155552671\"");
        assert!(serde_json::from_str::<PhoneNumber>("\"not-a-phone\"").is_err());
    }
}
