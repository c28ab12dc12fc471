//! SMS one-time passcode engine
//!
//! This module provides the complete passcode workflow:
//! - Code generation with the OS CSPRNG
//! - Keyed hashing bound to phone, code and purpose
//! - Per-phone rate limiting over minute, hour and day windows
//! - Attempt counting with temporary lockout
//! - Deterministic identity derivation for verified phones
//! - The dispatcher tying them to an SMS gateway and record stores

mod clock;
mod code_generator;
mod dispatcher;
mod hasher;
mod identity;
mod key_lock;
mod lockout;
mod rate_limiter;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code_generator::{CodeGenerator, SecureCodeGenerator};
pub use dispatcher::OtpDispatcher;
pub use hasher::OtpHasher;
pub use identity::{derive_uid, derive_uid_raw};
pub use key_lock::KeyedLocks;
pub use lockout::{LockoutPolicy, VerifyDecision};
pub use rate_limiter::RateLimiter;
pub use traits::SmsGateway;
pub use types::{
    PendingOtpStatus, RateLimitCheck, RateLimitStatus, SendCodeData, VerifyCodeData,
    WindowStatus,
};
