//! Shared utilities and common types for the PhoneVerify server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Stable error codes and the response envelope
//! - Utility functions (phone normalization and masking)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, Environment, LogFormat, LoggingConfig, OtpConfig,
    RateLimitConfig, SmsConfig, SmsProvider,
};
pub use errors::ErrorCode;
pub use types::OtpResponse;
pub use utils::phone;
