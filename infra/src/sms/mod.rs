//! SMS gateway module
//!
//! Implementations of `pv_core::SmsGateway`:
//!
//! - **Dry run**: logs a masked summary and returns a synthetic message id
//! - **HTTP**: form-encoded REST call with basic auth (Twilio-compatible)
//!
//! Gateways make a single delivery attempt. Retrying is left to the caller,
//! who must not charge quota for a send that never went out.

use std::sync::Arc;
use std::time::Duration;

use pv_core::SmsGateway;
use pv_shared::config::{SmsConfig, SmsProvider};

use crate::InfrastructureError;

pub mod dry_run;
pub mod http_gateway;

#[cfg(test)]
mod tests;

pub use dry_run::DryRunSmsGateway;
pub use http_gateway::HttpSmsGateway;

/// Create the SMS gateway selected by configuration
///
/// An HTTP provider with incomplete settings is a startup error; there is
/// no silent fallback to the dry-run gateway.
///
/// # Arguments
///
/// * `config` - SMS provider settings
/// * `timeout` - Upper bound on a single provider request
pub fn create_sms_gateway(
    config: &SmsConfig,
    timeout: Duration,
) -> Result<Arc<dyn SmsGateway>, InfrastructureError> {
    config.validate()?;

    let gateway: Arc<dyn SmsGateway> = match config.provider {
        SmsProvider::DryRun => Arc::new(DryRunSmsGateway::new()),
        SmsProvider::Http => Arc::new(HttpSmsGateway::new(config, timeout)?),
    };

    tracing::info!(provider = gateway.provider_name(), "SMS gateway initialised");
    Ok(gateway)
}
