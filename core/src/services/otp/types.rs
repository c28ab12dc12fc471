//! Types for OTP service results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pv_shared::RateLimitConfig;

use crate::domain::entities::{RateLimitRecord, RateWindow};
use crate::domain::value_objects::{DerivedUid, PhoneNumber, Purpose};
use crate::errors::OtpError;
use crate::repositories::Revision;

/// Result of sending a verification code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeData {
    /// Seconds the code stays valid
    pub ttl_seconds: u64,
    /// The SMS message ID from the provider
    pub message_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeData {
    pub phone_number: PhoneNumber,
    pub purpose: Purpose,
    pub verified_at: DateTime<Utc>,
    /// Identity bound to the verified phone number
    pub uid: DerivedUid,
}

/// Pending code details safe to expose (never the hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOtpStatus {
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
    pub remaining_attempts: u32,
    /// Present while the record is locked
    pub locked_until: Option<DateTime<Utc>>,
}

/// Outcome of a rate-limit check
///
/// Also carries the counters as read, so the follow-up increment can commit
/// against the same revision.
#[derive(Debug, Clone)]
pub struct RateLimitCheck {
    pub allowed: bool,
    /// Window that denied the request
    pub exceeded: Option<RateWindow>,
    /// When the denying window restarts
    pub reset_at: Option<DateTime<Utc>>,
    pub retry_after_seconds: Option<i64>,
    pub message: Option<String>,
    pub limits: RateLimitConfig,
    pub(crate) observed_revision: Option<Revision>,
    pub(crate) snapshot: RateLimitRecord,
}

impl RateLimitCheck {
    /// The typed denial, if the request is not allowed
    pub fn denial(&self) -> Option<OtpError> {
        if self.allowed {
            return None;
        }
        Some(OtpError::RateLimited {
            window: self.exceeded?,
            reset_at: self.reset_at?,
            retry_after_seconds: self.retry_after_seconds.unwrap_or(1),
            message: self.message.clone().unwrap_or_default(),
        })
    }
}

/// Usage of one rate-limit window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStatus {
    pub window: RateWindow,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Usage of every rate-limit window for a phone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub minute: WindowStatus,
    pub hour: WindowStatus,
    pub day: WindowStatus,
}

impl RateLimitStatus {
    /// Whether another send would currently be allowed
    pub fn can_send(&self) -> bool {
        self.minute.remaining > 0 && self.hour.remaining > 0 && self.day.remaining > 0
    }
}
