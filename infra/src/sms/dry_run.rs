//! Dry-run SMS gateway
//!
//! Nothing leaves the process. The message body carries the passcode, so it
//! is never logged; only its length is.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use pv_core::errors::DomainResult;
use pv_core::SmsGateway;
use pv_shared::utils::mask_phone_number;

use crate::InfrastructureError;

/// SMS gateway that logs instead of sending
///
/// Tracks how many messages it accepted, which tests and local runs use to
/// confirm a send happened.
#[derive(Clone, Default)]
pub struct DryRunSmsGateway {
    /// Counter for tracking number of messages accepted
    message_count: Arc<AtomicU64>,
    /// Whether to simulate failures (for testing)
    simulate_failure: bool,
}

impl DryRunSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that rejects every message
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Get the total number of messages accepted
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    pub fn reset_counter(&self) {
        self.message_count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl SmsGateway for DryRunSmsGateway {
    async fn send_sms(&self, phone_digits: &str, message: &str) -> DomainResult<String> {
        let masked_phone = mask_phone_number(&format!("+{}", phone_digits));

        if self.simulate_failure {
            warn!(
                provider = "dry-run",
                phone = %masked_phone,
                "Dry-run SMS gateway simulating failure"
            );
            return Err(
                InfrastructureError::Sms("Simulated SMS sending failure".to_string()).into(),
            );
        }

        let message_id = format!("dry-run-{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            target: "sms_service",
            provider = "dry-run",
            phone = %masked_phone,
            message_id = %message_id,
            message_length = message.len(),
            message_number = count,
            "SMS accepted (dry run)"
        );

        Ok(message_id)
    }

    fn provider_name(&self) -> &str {
        "dry-run"
    }
}
