//! Pending one-time passcode record and its storage keys

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_objects::{DerivedUid, PhoneNumber, Purpose};

/// Storage key of an OTP record
///
/// Records are written under the composite key. The legacy key predates
/// derived identities and is only read (and cleared) for compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OtpKey(String);

impl OtpKey {
    /// `otp:{uid}:{phone}:{purpose}`
    pub fn composite(uid: &DerivedUid, phone: &PhoneNumber, purpose: Purpose) -> Self {
        OtpKey(format!("otp:{}:{}:{}", uid, phone, purpose))
    }

    /// `otp:{phone}:{purpose}`
    pub fn legacy(phone: &PhoneNumber, purpose: Purpose) -> Self {
        OtpKey(format!("otp:{}:{}", phone, purpose))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sent passcode awaiting verification
///
/// Only the HMAC of the code is kept. Timestamps persist as epoch
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    /// Hex HMAC-SHA256 over phone, code and purpose
    pub hash: String,

    pub purpose: Purpose,

    pub phone_number: PhoneNumber,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,

    /// Verification attempts since creation or the last unlock
    pub attempts: u32,

    pub locked: bool,

    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub locked_until: Option<DateTime<Utc>>,

    /// Provider message id of the SMS that carried the code
    pub message_id: String,
}

impl OtpRecord {
    /// Create a fresh pending record
    pub fn new(
        phone_number: PhoneNumber,
        purpose: Purpose,
        hash: String,
        message_id: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            hash,
            purpose,
            phone_number,
            created_at: now,
            expires_at: now + ttl,
            attempts: 0,
            locked: false,
            locked_until: None,
            message_id,
        }
    }

    /// Expired strictly after `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Locked through `locked_until` inclusive
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked && self.locked_until.is_some_and(|until| now <= until)
    }

    /// Attempts left before the record locks
    pub fn remaining_attempts(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.attempts)
    }

    /// Clear an elapsed lock, starting a fresh round of attempts
    pub fn unlock(&mut self) {
        self.locked = false;
        self.locked_until = None;
        self.attempts = 0;
    }

    /// Lock the record until `until`
    pub fn lock(&mut self, until: DateTime<Utc>) {
        self.locked = true;
        self.locked_until = Some(until);
    }
}
