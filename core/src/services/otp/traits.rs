//! Traits for SMS gateway integration

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Trait for SMS gateway integration
///
/// Implementations make a single delivery attempt; any error is treated as a
/// transport failure by the caller.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `message` to `phone_digits` (E.164 digits without `+`),
    /// returning the provider message id
    async fn send_sms(&self, phone_digits: &str, message: &str) -> DomainResult<String>;

    /// Provider name for logs
    fn provider_name(&self) -> &str;
}
