use chrono::{Duration, TimeZone, Utc};

use pv_shared::{ConfigError, ErrorCode, OtpResponse};

use crate::domain::entities::RateWindow;
use crate::errors::otp_error::seconds_until;
use crate::errors::{DomainError, OtpError};

#[test]
fn test_error_codes() {
    let now = Utc::now();
    let cases = vec![
        (
            OtpError::RateLimited {
                window: RateWindow::Hour,
                reset_at: now,
                retry_after_seconds: 10,
                message: "wait".to_string(),
            },
            ErrorCode::RateLimitHour,
        ),
        (
            OtpError::SmsSendFailed {
                reason: "timeout".to_string(),
            },
            ErrorCode::SmsSendFailed,
        ),
        (OtpError::NotFound, ErrorCode::OtpNotFound),
        (OtpError::Expired, ErrorCode::OtpExpired),
        (
            OtpError::Locked {
                locked_until: now,
                remaining_seconds: 1,
            },
            ErrorCode::OtpLocked,
        ),
        (
            OtpError::MaxAttemptsExceeded { locked_until: now },
            ErrorCode::MaxAttemptsExceeded,
        ),
        (
            OtpError::InvalidCode {
                remaining_attempts: 2,
            },
            ErrorCode::InvalidOtp,
        ),
        (
            OtpError::InvalidInput {
                message: "bad".to_string(),
            },
            ErrorCode::InvalidInput,
        ),
        (
            OtpError::Internal(DomainError::Storage {
                message: "down".to_string(),
            }),
            ErrorCode::InternalError,
        ),
    ];

    for (error, code) in cases {
        assert_eq!(error.code(), code);
    }
}

#[test]
fn test_internal_response_hides_cause() {
    let error = OtpError::from(DomainError::Storage {
        message: "redis://secret-host refused connection".to_string(),
    });
    assert!(error.is_internal());

    let response: OtpResponse<()> = error.to_response(Utc::now());
    assert_eq!(response.code, Some(ErrorCode::InternalError));
    assert!(!response.message.contains("secret-host"));
}

#[test]
fn test_lockout_responses_carry_retry_hints() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let until = now + Duration::minutes(5);

    let response: OtpResponse<()> =
        OtpError::MaxAttemptsExceeded { locked_until: until }.to_response(now);
    assert_eq!(response.retry_at, Some(until));
    assert_eq!(response.remaining_seconds, Some(300));
    assert_eq!(response.remaining_attempts, Some(0));

    let response: OtpResponse<()> = OtpError::InvalidCode {
        remaining_attempts: 3,
    }
    .to_response(now);
    assert_eq!(response.remaining_attempts, Some(3));
    assert!(response.message.contains("3 attempts remaining"));
}

#[test]
fn test_seconds_until_rounds_up() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    assert_eq!(seconds_until(now, now + Duration::milliseconds(1)), 1);
    assert_eq!(seconds_until(now, now + Duration::milliseconds(1500)), 2);
    assert_eq!(seconds_until(now, now + Duration::seconds(45)), 45);
    assert_eq!(seconds_until(now, now), 1);
}

#[test]
fn test_config_error_conversion() {
    let error: DomainError = ConfigError::Missing("otp.server_secret").into();
    assert!(matches!(error, DomainError::Configuration { .. }));
    assert!(error.to_string().contains("otp.server_secret"));
}
