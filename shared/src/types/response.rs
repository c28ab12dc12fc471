//! Response envelope returned by the OTP engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorCode;

/// Standard response wrapper: `{ok, code?, message, data?}`
///
/// Lockout and rate-limit denials also carry `retry_at` so clients can back
/// off; wrong-code results carry `remaining_attempts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse<T> {
    /// Whether the operation succeeded
    pub ok: bool,

    /// Stable error code (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,

    /// Human-readable message
    pub message: String,

    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Earliest time a retry can succeed (rate limit / lockout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_at: Option<DateTime<Utc>>,

    /// Seconds until `retry_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,

    /// Wrong attempts left before lockout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

impl<T> OtpResponse<T> {
    /// Create a successful response
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            ok: true,
            code: None,
            message: message.into(),
            data: Some(data),
            retry_at: None,
            remaining_seconds: None,
            remaining_attempts: None,
        }
    }

    /// Create an error response
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: Some(code),
            message: message.into(),
            data: None,
            retry_at: None,
            remaining_seconds: None,
            remaining_attempts: None,
        }
    }

    /// Attach a back-off hint
    pub fn with_retry_at(mut self, retry_at: DateTime<Utc>, remaining_seconds: i64) -> Self {
        self.retry_at = Some(retry_at);
        self.remaining_seconds = Some(remaining_seconds);
        self
    }

    /// Attach the number of attempts left
    pub fn with_remaining_attempts(mut self, remaining: u32) -> Self {
        self.remaining_attempts = Some(remaining);
        self
    }

    /// Check if the response is an error
    pub fn is_error(&self) -> bool {
        !self.ok
    }

    /// Extract the data, consuming the response
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}
