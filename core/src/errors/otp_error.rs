//! Typed outcomes of the send and verify flows

use chrono::{DateTime, Utc};
use thiserror::Error;

use pv_shared::{ErrorCode, OtpResponse};

use crate::domain::entities::RateWindow;

use super::DomainError;

/// Everything `send` or `verify` can fail with
///
/// Policy denials are expected results and carry what a client needs to
/// back off. Only `Internal` represents an unexpected failure.
#[derive(Error, Debug)]
pub enum OtpError {
    #[error("{message}")]
    RateLimited {
        window: RateWindow,
        reset_at: DateTime<Utc>,
        retry_after_seconds: i64,
        message: String,
    },

    #[error("Failed to send verification code")]
    SmsSendFailed { reason: String },

    #[error("No pending verification code")]
    NotFound,

    #[error("Verification code expired")]
    Expired,

    #[error("Too many attempts. Try again in {remaining_seconds} seconds")]
    Locked {
        locked_until: DateTime<Utc>,
        remaining_seconds: i64,
    },

    #[error("Maximum attempts exceeded")]
    MaxAttemptsExceeded { locked_until: DateTime<Utc> },

    #[error("Invalid verification code")]
    InvalidCode { remaining_attempts: u32 },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error(transparent)]
    Internal(#[from] DomainError),
}

impl OtpError {
    /// Stable wire code for this outcome
    pub fn code(&self) -> ErrorCode {
        match self {
            OtpError::RateLimited { window, .. } => window.error_code(),
            OtpError::SmsSendFailed { .. } => ErrorCode::SmsSendFailed,
            OtpError::NotFound => ErrorCode::OtpNotFound,
            OtpError::Expired => ErrorCode::OtpExpired,
            OtpError::Locked { .. } => ErrorCode::OtpLocked,
            OtpError::MaxAttemptsExceeded { .. } => ErrorCode::MaxAttemptsExceeded,
            OtpError::InvalidCode { .. } => ErrorCode::InvalidOtp,
            OtpError::InvalidInput { .. } => ErrorCode::InvalidInput,
            OtpError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, OtpError::Internal(_))
    }

    /// Failure envelope with back-off hints where they apply
    ///
    /// Internal errors get a generic message; the cause is for logs only.
    pub fn to_response<T>(&self, now: DateTime<Utc>) -> OtpResponse<T> {
        match self {
            OtpError::RateLimited {
                reset_at,
                retry_after_seconds,
                ..
            } => OtpResponse::failure(self.code(), self.to_string())
                .with_retry_at(*reset_at, *retry_after_seconds),
            OtpError::Locked {
                locked_until,
                remaining_seconds,
            } => OtpResponse::failure(self.code(), self.to_string())
                .with_retry_at(*locked_until, *remaining_seconds),
            OtpError::MaxAttemptsExceeded { locked_until } => {
                let remaining = seconds_until(now, *locked_until);
                OtpResponse::failure(
                    self.code(),
                    format!(
                        "Maximum attempts exceeded. Try again in {} seconds",
                        remaining
                    ),
                )
                .with_retry_at(*locked_until, remaining)
                .with_remaining_attempts(0)
            }
            OtpError::InvalidCode { remaining_attempts } => OtpResponse::failure(
                self.code(),
                format!(
                    "Invalid verification code. {} attempts remaining",
                    remaining_attempts
                ),
            )
            .with_remaining_attempts(*remaining_attempts),
            OtpError::Internal(_) => {
                OtpResponse::failure(self.code(), "An internal error occurred")
            }
            _ => OtpResponse::failure(self.code(), self.to_string()),
        }
    }
}

/// Whole seconds from `now` until `at`, rounded up, at least 1
pub(crate) fn seconds_until(now: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    let millis = (at - now).num_milliseconds();
    ((millis + 999) / 1000).max(1)
}
