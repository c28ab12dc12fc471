//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `otp` - Passcode lifetime, lockout policy and hashing secret
//! - `rate_limit` - Per-phone send quotas (minute / hour / day)
//! - `cache` - Redis connection settings for durable records
//! - `sms` - SMS gateway provider settings
//! - `environment` - Environment detection and logging configuration

pub mod cache;
pub mod environment;
pub mod otp;
pub mod rate_limit;
pub mod sms;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use cache::CacheConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::OtpConfig;
pub use rate_limit::RateLimitConfig;
pub use sms::{SmsConfig, SmsProvider};

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Passcode policy configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Redis configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// SMS gateway configuration
    #[serde(default)]
    pub sms: SmsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            otp: OtpConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            sms: SmsConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    ///
    /// Development runs in dry-run mode so no real SMS is sent.
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            otp: OtpConfig {
                dry_run: true,
                ..Default::default()
            },
            rate_limit: RateLimitConfig::development(),
            cache: CacheConfig::default(),
            sms: SmsConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            otp: OtpConfig::default(),
            rate_limit: RateLimitConfig::production(),
            cache: CacheConfig::default(),
            sms: SmsConfig {
                provider: SmsProvider::Http,
                ..Default::default()
            },
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Validate every section that carries invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.otp.validate()?;
        self.rate_limit.validate()?;
        self.sms.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_requires_secret() {
        let config = AppConfig::default();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing("otp.server_secret"))
        );
    }

    #[test]
    fn test_development_config_is_dry_run() {
        let config = AppConfig::development();
        assert!(config.otp.dry_run);
        assert_eq!(config.sms.provider, SmsProvider::DryRun);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_production_config_uses_http_gateway() {
        let config = AppConfig::production();
        assert!(!config.otp.dry_run);
        assert_eq!(config.sms.provider, SmsProvider::Http);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let json = r#"{
            "otp": { "server_secret": "s3cret-value-for-tests" },
            "rate_limit": { "per_hour": 4 }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.otp.ttl_seconds, 600);
        assert_eq!(config.rate_limit.per_minute, 1);
        assert_eq!(config.rate_limit.per_hour, 4);
        assert!(config.validate().is_ok());
    }
}
