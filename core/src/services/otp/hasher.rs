//! Keyed passcode hashing

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::domain::value_objects::{PhoneNumber, Purpose};
use crate::errors::{DomainError, DomainResult};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over `"{phone}:{code}:{purpose}"` keyed with the server secret
///
/// A hash only verifies for the phone and purpose it was computed for.
#[derive(Clone)]
pub struct OtpHasher {
    mac: HmacSha256,
}

impl OtpHasher {
    /// Create a hasher; the secret must not be empty
    pub fn new(secret: &str) -> DomainResult<Self> {
        if secret.trim().is_empty() {
            return Err(DomainError::Configuration {
                message: "server secret must not be empty".to_string(),
            });
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
            DomainError::Configuration {
                message: "server secret rejected by HMAC".to_string(),
            }
        })?;
        Ok(Self { mac })
    }

    /// Lowercase hex digest for a code
    pub fn compute_hash(&self, phone: &PhoneNumber, code: &str, purpose: Purpose) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{}:{}:{}", phone, code, purpose).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Recompute and compare in constant time
    pub fn verify(&self, phone: &PhoneNumber, code: &str, purpose: Purpose, stored_hash: &str) -> bool {
        let computed = self.compute_hash(phone, code, purpose);
        constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
    }
}

impl fmt::Debug for OtpHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpHasher")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
