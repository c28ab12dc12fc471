//! Assembly of the OTP engine from configuration
//!
//! The dispatcher is built over trait objects so the gateway and stores can
//! be chosen at runtime.

use std::sync::Arc;
use std::time::Duration;

use pv_core::domain::entities::{OtpRecord, RateLimitRecord};
use pv_core::repositories::{InMemoryRecordStore, RecordStore};
use pv_core::{OtpDispatcher, SmsGateway};
use pv_shared::config::{AppConfig, OtpConfig};

use crate::sms::create_sms_gateway;
use crate::InfrastructureError;

/// Store of pending passcodes
pub type DynOtpStore = dyn RecordStore<OtpRecord>;

/// Store of per-phone send counters
pub type DynRateLimitStore = dyn RecordStore<RateLimitRecord>;

/// Dispatcher over runtime-selected collaborators
pub type Dispatcher = OtpDispatcher<dyn SmsGateway, DynOtpStore, DynRateLimitStore>;

/// How long a rate-limit record outlives its last write: the day window plus slack
pub const RATE_LIMIT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60 + 60);

/// How long a passcode record outlives its last write
///
/// A record locked on its final second must keep its lock for the full
/// lock duration.
pub fn otp_retention(config: &OtpConfig) -> Duration {
    Duration::from_secs(
        config
            .ttl_seconds
            .saturating_add(config.lock_duration_seconds()),
    )
}

/// Build a dispatcher from explicit collaborators
pub fn build_dispatcher(
    config: &AppConfig,
    sms: Arc<dyn SmsGateway>,
    otp_store: Arc<DynOtpStore>,
    rate_store: Arc<DynRateLimitStore>,
) -> Result<Dispatcher, InfrastructureError> {
    let dispatcher = OtpDispatcher::new(
        sms,
        otp_store,
        rate_store,
        config.otp.clone(),
        config.rate_limit.clone(),
    )?;
    Ok(dispatcher)
}

/// Dispatcher keeping its records in process memory
///
/// Records are lost on restart and not shared between processes.
pub fn build_in_memory(config: &AppConfig) -> Result<Dispatcher, InfrastructureError> {
    let sms = create_sms_gateway(&config.sms, sms_timeout(config))?;
    let otp_store: Arc<DynOtpStore> = Arc::new(InMemoryRecordStore::<OtpRecord>::new());
    let rate_store: Arc<DynRateLimitStore> = Arc::new(InMemoryRecordStore::<RateLimitRecord>::new());

    tracing::info!(storage = "memory", "Building OTP dispatcher");
    build_dispatcher(config, sms, otp_store, rate_store)
}

/// Dispatcher keeping its records in Redis
#[cfg(feature = "redis-cache")]
pub async fn build_with_redis(config: &AppConfig) -> Result<Dispatcher, InfrastructureError> {
    use crate::cache::{RedisClient, RedisRecordStore};

    let sms = create_sms_gateway(&config.sms, sms_timeout(config))?;
    let client = RedisClient::new(config.cache.clone()).await?;

    let otp_store: Arc<DynOtpStore> = Arc::new(RedisRecordStore::<OtpRecord>::new(
        client.clone(),
        otp_retention(&config.otp),
    ));
    let rate_store: Arc<DynRateLimitStore> = Arc::new(RedisRecordStore::<RateLimitRecord>::new(
        client,
        RATE_LIMIT_RETENTION,
    ));

    tracing::info!(storage = "redis", "Building OTP dispatcher");
    build_dispatcher(config, sms, otp_store, rate_store)
}

/// Load configuration, install logging and connect to Redis
#[cfg(feature = "redis-cache")]
pub async fn initialize() -> Result<(AppConfig, Dispatcher), InfrastructureError> {
    let config = crate::settings::load_config()?;
    crate::telemetry::init_tracing(&config.logging);

    let dispatcher = build_with_redis(&config).await?;
    tracing::info!(environment = %config.environment, "OTP engine ready");
    Ok((config, dispatcher))
}

fn sms_timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.otp.sms_timeout_seconds)
}
