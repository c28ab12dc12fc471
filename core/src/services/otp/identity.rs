//! Deterministic identity for verified phone numbers

use sha2::{Digest, Sha256};

use crate::domain::value_objects::{DerivedUid, PhoneNumber};
use crate::errors::OtpError;

/// `uid_` + first 24 hex characters of SHA-256 over the E.164 number
pub fn derive_uid(phone: &PhoneNumber) -> DerivedUid {
    let digest = Sha256::digest(phone.as_str().as_bytes());
    DerivedUid::from_digest_hex(&hex::encode(digest))
}

/// Normalize a raw number, then derive its uid
pub fn derive_uid_raw(raw: &str) -> Result<DerivedUid, OtpError> {
    let phone = PhoneNumber::parse(raw).map_err(|e| OtpError::InvalidInput {
        message: e.to_string(),
    })?;
    Ok(derive_uid(&phone))
}
