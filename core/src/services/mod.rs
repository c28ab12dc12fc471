//! Business services containing domain logic and use cases.

pub mod otp;

// Re-export commonly used types
pub use otp::{
    derive_uid, derive_uid_raw, Clock, CodeGenerator, LockoutPolicy, ManualClock,
    OtpDispatcher, OtpHasher, PendingOtpStatus, RateLimitCheck, RateLimitStatus, RateLimiter,
    SecureCodeGenerator, SendCodeData, SmsGateway, SystemClock, VerifyCodeData, VerifyDecision,
    WindowStatus,
};
