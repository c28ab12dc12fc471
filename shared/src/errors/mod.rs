//! Stable, machine-readable error codes
//!
//! These strings are part of the external contract; clients branch on them,
//! so variants are only ever added, never renamed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried by every failed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RateLimitMinute,
    RateLimitHour,
    RateLimitDay,
    SmsSendFailed,
    OtpNotFound,
    OtpExpired,
    OtpLocked,
    MaxAttemptsExceeded,
    InvalidOtp,
    InvalidInput,
    InternalError,
}

impl ErrorCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RateLimitMinute => "RATE_LIMIT_MINUTE",
            ErrorCode::RateLimitHour => "RATE_LIMIT_HOUR",
            ErrorCode::RateLimitDay => "RATE_LIMIT_DAY",
            ErrorCode::SmsSendFailed => "SMS_SEND_FAILED",
            ErrorCode::OtpNotFound => "OTP_NOT_FOUND",
            ErrorCode::OtpExpired => "OTP_EXPIRED",
            ErrorCode::OtpLocked => "OTP_LOCKED",
            ErrorCode::MaxAttemptsExceeded => "MAX_ATTEMPTS_EXCEEDED",
            ErrorCode::InvalidOtp => "INVALID_OTP",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
