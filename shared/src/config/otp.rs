//! One-time passcode policy configuration

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConfigError;

/// Number of digits in a passcode. Fixed; kept in config for visibility.
pub const CODE_LENGTH: usize = 6;

/// Longest accepted code lifetime
pub const MAX_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Longest accepted lockout
pub const MAX_LOCK_DURATION_MINUTES: u64 = 24 * 60;

/// Passcode policy configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Number of digits in a generated code (must be 6)
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds a code stays valid after it is sent
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Wrong attempts allowed before the record locks
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Minutes a record stays locked after the last allowed wrong attempt
    #[serde(default = "default_lock_duration_minutes")]
    pub lock_duration_minutes: u64,

    /// HMAC key binding phone, code and purpose
    #[serde(default)]
    pub server_secret: String,

    /// Skip the SMS gateway and report a synthetic success
    #[serde(default)]
    pub dry_run: bool,

    /// Upper bound on a single SMS gateway call
    #[serde(default = "default_sms_timeout_seconds")]
    pub sms_timeout_seconds: u64,

    /// Look up records written under the legacy `(phone, purpose)` key
    /// when the composite key is absent. Remove once legacy writers are gone.
    #[serde(default = "default_legacy_key_fallback")]
    pub legacy_key_fallback: bool,

    /// SMS body; `{code}` and `{minutes}` are substituted
    #[serde(default = "default_message_template")]
    pub message_template: String,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            ttl_seconds: default_ttl_seconds(),
            max_attempts: default_max_attempts(),
            lock_duration_minutes: default_lock_duration_minutes(),
            server_secret: String::new(),
            dry_run: false,
            sms_timeout_seconds: default_sms_timeout_seconds(),
            legacy_key_fallback: default_legacy_key_fallback(),
            message_template: default_message_template(),
        }
    }
}

// The secret never reaches logs through Debug.
impl fmt::Debug for OtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpConfig")
            .field("code_length", &self.code_length)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("max_attempts", &self.max_attempts)
            .field("lock_duration_minutes", &self.lock_duration_minutes)
            .field("server_secret", &"[REDACTED]")
            .field("dry_run", &self.dry_run)
            .field("sms_timeout_seconds", &self.sms_timeout_seconds)
            .field("legacy_key_fallback", &self.legacy_key_fallback)
            .field("message_template", &self.message_template)
            .finish()
    }
}

impl OtpConfig {
    /// Create a configuration with the given secret and default policy
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            server_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Lock duration in seconds
    pub fn lock_duration_seconds(&self) -> u64 {
        self.lock_duration_minutes.saturating_mul(60)
    }

    /// Render the SMS body for a code
    pub fn render_message(&self, code: &str) -> String {
        let minutes = self.ttl_seconds.saturating_add(59) / 60;
        self.message_template
            .replace("{code}", code)
            .replace("{minutes}", &minutes.to_string())
    }

    /// Check the invariants the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_secret.trim().is_empty() {
            return Err(ConfigError::Missing("otp.server_secret"));
        }
        if self.code_length != CODE_LENGTH {
            return Err(ConfigError::Invalid {
                field: "otp.code_length",
                reason: format!("only {}-digit codes are supported", CODE_LENGTH),
            });
        }
        if self.ttl_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "otp.ttl_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::Invalid {
                field: "otp.ttl_seconds",
                reason: format!("must not exceed {} seconds", MAX_TTL_SECONDS),
            });
        }
        if self.lock_duration_minutes > MAX_LOCK_DURATION_MINUTES {
            return Err(ConfigError::Invalid {
                field: "otp.lock_duration_minutes",
                reason: format!("must not exceed {} minutes", MAX_LOCK_DURATION_MINUTES),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "otp.max_attempts",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.sms_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "otp.sms_timeout_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !self.message_template.contains("{code}") {
            return Err(ConfigError::Invalid {
                field: "otp.message_template",
                reason: "must contain the {code} placeholder".to_string(),
            });
        }
        Ok(())
    }
}

fn default_code_length() -> usize {
    CODE_LENGTH
}

fn default_ttl_seconds() -> u64 {
    600 // 10 minutes
}

fn default_max_attempts() -> u32 {
    5
}

fn default_lock_duration_minutes() -> u64 {
    5
}

fn default_sms_timeout_seconds() -> u64 {
    10
}

fn default_legacy_key_fallback() -> bool {
    true
}

fn default_message_template() -> String {
    String::from("Your verification code is {code}. It expires in {minutes} minutes.")
}
