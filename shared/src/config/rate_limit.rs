//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Per-phone SMS send quotas
///
/// Each window counts independently and resets on its own clock.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Max codes sent to one phone per minute
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,

    /// Max codes sent to one phone per hour
    #[serde(default = "default_per_hour")]
    pub per_hour: u32,

    /// Max codes sent to one phone per day
    #[serde(default = "default_per_day")]
    pub per_day: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            per_hour: default_per_hour(),
            per_day: default_per_day(),
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with explicit limits
    pub fn new(per_minute: u32, per_hour: u32, per_day: u32) -> Self {
        Self {
            per_minute,
            per_hour,
            per_day,
        }
    }

    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            per_minute: 5,
            per_hour: 30,
            per_day: 100,
        }
    }

    /// Create a production configuration (stricter limits)
    pub fn production() -> Self {
        Self::default()
    }

    /// Limits must be positive; a zero limit would block every send
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("rate_limit.per_minute", self.per_minute),
            ("rate_limit.per_hour", self.per_hour),
            ("rate_limit.per_day", self.per_day),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn default_per_minute() -> u32 {
    1
}

fn default_per_hour() -> u32 {
    3
}

fn default_per_day() -> u32 {
    5
}
