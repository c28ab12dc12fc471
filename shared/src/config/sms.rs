//! SMS gateway configuration module

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConfigError;

/// Which SMS gateway implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SmsProvider {
    /// Log instead of sending; always succeeds
    #[default]
    DryRun,
    /// REST provider reached over HTTPS
    Http,
}

/// SMS gateway configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    /// Gateway implementation
    #[serde(default)]
    pub provider: SmsProvider,

    /// Provider message endpoint (e.g. `https://api.twilio.com/2010-04-01/Accounts/{account}/Messages.json`)
    #[serde(default)]
    pub endpoint: String,

    /// Provider account identifier, used as basic auth user
    #[serde(default)]
    pub account_id: String,

    /// Provider auth token, used as basic auth password
    #[serde(default)]
    pub auth_token: String,

    /// Sender number or alphanumeric sender id
    #[serde(default)]
    pub from_number: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: SmsProvider::default(),
            endpoint: String::new(),
            account_id: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
        }
    }
}

impl fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("account_id", &self.account_id)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .finish()
    }
}

impl SmsConfig {
    /// Provider endpoint with the `{account}` placeholder filled in
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint.replace("{account}", &self.account_id)
    }

    /// HTTP providers need credentials and an endpoint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == SmsProvider::DryRun {
            return Ok(());
        }
        if self.endpoint.is_empty() {
            return Err(ConfigError::Missing("sms.endpoint"));
        }
        if self.account_id.is_empty() {
            return Err(ConfigError::Missing("sms.account_id"));
        }
        if self.auth_token.is_empty() {
            return Err(ConfigError::Missing("sms.auth_token"));
        }
        if self.from_number.is_empty() {
            return Err(ConfigError::Missing("sms.from_number"));
        }
        Ok(())
    }
}
