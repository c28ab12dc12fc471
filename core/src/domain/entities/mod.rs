//! Domain entities persisted by the OTP engine.

pub mod otp_record;
pub mod rate_limit_record;


// Re-export commonly used types
pub use otp_record::{OtpKey, OtpRecord};
pub use rate_limit_record::{RateLimitRecord, RateWindow, WindowCounter};
