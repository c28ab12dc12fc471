//! OTP dispatcher: the send and verify flows

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use pv_shared::{OtpConfig, OtpResponse, RateLimitConfig};

use crate::domain::entities::{OtpKey, OtpRecord, RateLimitRecord};
use crate::domain::value_objects::{PhoneNumber, Purpose};
use crate::errors::{DomainError, DomainResult, OtpError};
use crate::repositories::{RecordStore, Stored};

use super::clock::{Clock, SystemClock};
use super::code_generator::{is_well_formed, CodeGenerator, SecureCodeGenerator};
use super::hasher::OtpHasher;
use super::identity::derive_uid;
use super::key_lock::KeyedLocks;
use super::lockout::{LockoutPolicy, VerifyDecision};
use super::rate_limiter::RateLimiter;
use super::traits::SmsGateway;
use super::types::{PendingOtpStatus, RateLimitStatus, SendCodeData, VerifyCodeData};

/// Compare-and-swap attempts before a verify gives up
const MAX_VERIFY_RETRIES: usize = 5;

/// OTP dispatcher for sending and verifying SMS passcodes
///
/// Stores are injected and shared through `Arc`; the dispatcher itself holds
/// no record state beyond the per-phone send locks.
pub struct OtpDispatcher<S: ?Sized, O: ?Sized, L: ?Sized> {
    /// SMS gateway for delivering codes
    sms: Arc<S>,
    /// Pending passcode records
    otp_store: Arc<O>,
    rate_limiter: RateLimiter<L>,
    hasher: OtpHasher,
    lockout: LockoutPolicy,
    config: OtpConfig,
    clock: Arc<dyn Clock>,
    code_generator: Arc<dyn CodeGenerator>,
    send_locks: KeyedLocks,
}

impl<S, O, L> OtpDispatcher<S, O, L>
where
    S: SmsGateway + ?Sized,
    O: RecordStore<OtpRecord> + ?Sized,
    L: RecordStore<RateLimitRecord> + ?Sized,
{
    /// Create a dispatcher
    ///
    /// # Arguments
    ///
    /// * `sms` - SMS gateway implementation
    /// * `otp_store` - Store for pending passcode records
    /// * `rate_store` - Store for rate-limit counters
    /// * `config` - Passcode policy; validated here
    /// * `limits` - Per-phone send quotas; validated here
    pub fn new(
        sms: Arc<S>,
        otp_store: Arc<O>,
        rate_store: Arc<L>,
        config: OtpConfig,
        limits: RateLimitConfig,
    ) -> DomainResult<Self> {
        config.validate()?;
        limits.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let hasher = OtpHasher::new(&config.server_secret)?;
        let lockout = LockoutPolicy::new(
            config.max_attempts,
            Duration::seconds(config.lock_duration_seconds() as i64),
        );

        Ok(Self {
            sms,
            otp_store,
            rate_limiter: RateLimiter::new(rate_store, limits, Arc::clone(&clock)),
            hasher,
            lockout,
            config,
            clock,
            code_generator: Arc::new(SecureCodeGenerator),
            send_locks: KeyedLocks::new(),
        })
    }

    /// Replace the time source (rate limiter included)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.rate_limiter = self.rate_limiter.with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    /// Replace the code generator
    pub fn with_code_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.code_generator = generator;
        self
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Send a verification code
    ///
    /// Quota is charged and the record persisted only after the gateway
    /// accepted the message. Sends to the same phone are serialized.
    ///
    /// The send lock is per process: with several instances sharing a store,
    /// concurrent sends to one phone can both pass `check` and exceed
    /// `per_minute`, although every increment is still counted exactly.
    pub async fn try_send(&self, phone: &str, purpose: Purpose) -> Result<SendCodeData, OtpError> {
        let phone = parse_phone(phone)?;
        let _guard = self.send_locks.acquire(phone.as_str()).await;

        let check = self.rate_limiter.check(&phone).await?;
        if let Some(denial) = check.denial() {
            return Err(denial);
        }

        let code = self.code_generator.generate();
        let hash = self.hasher.compute_hash(&phone, &code, purpose);
        let message_id = self.dispatch_sms(&phone, purpose, &code).await?;

        let now = self.clock.now();
        let ttl = Duration::seconds(self.config.ttl_seconds as i64);
        let record = OtpRecord::new(phone.clone(), purpose, hash, message_id.clone(), now, ttl);
        let expires_at = record.expires_at;

        let uid = derive_uid(&phone);
        self.otp_store
            .put(OtpKey::composite(&uid, &phone, purpose).as_str(), &record)
            .await
            .map_err(|e| {
                tracing::error!(
                    phone = %phone.masked(),
                    purpose = %purpose,
                    error = %e,
                    event = "otp_storage_failed",
                    "Failed to store verification code record"
                );
                e
            })?;
        // A code written under the old layout must not resurface via fallback
        self.otp_store
            .delete(OtpKey::legacy(&phone, purpose).as_str())
            .await?;

        self.rate_limiter.increment(&phone, &check).await?;

        tracing::info!(
            phone = %phone.masked(),
            purpose = %purpose,
            message_id = %message_id,
            expires_at = %expires_at,
            event = "otp_sent",
            "Sent verification code"
        );

        Ok(SendCodeData {
            ttl_seconds: self.config.ttl_seconds,
            message_id,
            expires_at,
        })
    }

    /// Verify a code
    ///
    /// Each attempt is committed with compare-and-swap against the revision
    /// it was evaluated on, so concurrent attempts are all counted.
    pub async fn try_verify(
        &self,
        phone: &str,
        code: &str,
        purpose: Purpose,
    ) -> Result<VerifyCodeData, OtpError> {
        let phone = parse_phone(phone)?;
        if !is_well_formed(code) {
            tracing::warn!(
                phone = %phone.masked(),
                purpose = %purpose,
                code_length = code.len(),
                event = "invalid_code_format",
                "Invalid verification code format provided"
            );
            return Err(OtpError::InvalidInput {
                message: "Verification code must be 6 digits".to_string(),
            });
        }

        let uid = derive_uid(&phone);

        for _ in 0..MAX_VERIFY_RETRIES {
            let Some((key, stored)) = self.load(&phone, purpose).await? else {
                tracing::info!(
                    phone = %phone.masked(),
                    purpose = %purpose,
                    event = "otp_not_found",
                    "No pending verification code"
                );
                return Err(OtpError::NotFound);
            };

            let now = self.clock.now();
            let matches = self.hasher.verify(&phone, code, purpose, &stored.value.hash);
            let decision = self.lockout.evaluate(&stored.value, now, matches);

            let committed = match &decision {
                VerifyDecision::Locked { .. } => true,
                VerifyDecision::Expired | VerifyDecision::Accepted => {
                    self.otp_store
                        .compare_and_swap(key.as_str(), Some(stored.revision), None)
                        .await?
                }
                VerifyDecision::Rejected { record, .. } | VerifyDecision::LockedOut { record, .. } => {
                    self.otp_store
                        .compare_and_swap(key.as_str(), Some(stored.revision), Some(record))
                        .await?
                }
            };
            if !committed {
                tracing::debug!(
                    phone = %phone.masked(),
                    purpose = %purpose,
                    event = "otp_verify_conflict",
                    "Record changed during verification, retrying"
                );
                continue;
            }

            return match decision {
                VerifyDecision::Accepted => {
                    tracing::info!(
                        phone = %phone.masked(),
                        purpose = %purpose,
                        uid = %uid,
                        event = "otp_verified",
                        "Verification code successfully verified"
                    );
                    Ok(VerifyCodeData {
                        phone_number: phone,
                        purpose,
                        verified_at: now,
                        uid,
                    })
                }
                VerifyDecision::Expired => {
                    tracing::info!(
                        phone = %phone.masked(),
                        purpose = %purpose,
                        event = "otp_expired",
                        "Verification code expired"
                    );
                    Err(OtpError::Expired)
                }
                VerifyDecision::Locked {
                    locked_until,
                    remaining_seconds,
                } => {
                    tracing::warn!(
                        phone = %phone.masked(),
                        purpose = %purpose,
                        remaining_seconds = remaining_seconds,
                        event = "otp_locked",
                        "Verification attempted while locked"
                    );
                    Err(OtpError::Locked {
                        locked_until,
                        remaining_seconds,
                    })
                }
                VerifyDecision::Rejected {
                    remaining_attempts, ..
                } => {
                    tracing::warn!(
                        phone = %phone.masked(),
                        purpose = %purpose,
                        remaining_attempts = remaining_attempts,
                        event = "otp_verification_failed",
                        "Verification code verification failed"
                    );
                    Err(OtpError::InvalidCode { remaining_attempts })
                }
                VerifyDecision::LockedOut { locked_until, .. } => {
                    tracing::warn!(
                        phone = %phone.masked(),
                        purpose = %purpose,
                        locked_until = %locked_until,
                        event = "max_attempts_exceeded",
                        "Maximum verification attempts exceeded"
                    );
                    Err(OtpError::MaxAttemptsExceeded { locked_until })
                }
            };
        }

        Err(OtpError::Internal(DomainError::Conflict {
            message: format!(
                "verification record kept changing after {} attempts",
                MAX_VERIFY_RETRIES
            ),
        }))
    }

    /// Send a code, returning the response envelope
    pub async fn send(&self, phone: &str, purpose: Purpose) -> OtpResponse<SendCodeData> {
        match self.try_send(phone, purpose).await {
            Ok(data) => OtpResponse::success("Verification code sent", data),
            Err(err) => self.failure("send", purpose, err),
        }
    }

    /// Verify a code, returning the response envelope
    pub async fn verify(&self, phone: &str, code: &str, purpose: Purpose) -> OtpResponse<VerifyCodeData> {
        match self.try_verify(phone, code, purpose).await {
            Ok(data) => OtpResponse::success("Verification successful", data),
            Err(err) => self.failure("verify", purpose, err),
        }
    }

    /// Pending code details, or `None` when there is no live code
    pub async fn pending_status(
        &self,
        phone: &str,
        purpose: Purpose,
    ) -> Result<Option<PendingOtpStatus>, OtpError> {
        let phone = parse_phone(phone)?;
        let now = self.clock.now();

        let max_attempts = self.lockout.max_attempts();
        let status = self
            .load(&phone, purpose)
            .await?
            .map(|(_, stored)| stored.value)
            .filter(|record| !record.is_expired(now))
            .map(|mut record| {
                if record.locked && !record.is_locked(now) {
                    record.unlock();
                }
                PendingOtpStatus {
                    expires_at: record.expires_at,
                    attempts: record.attempts,
                    remaining_attempts: if record.locked {
                        0
                    } else {
                        record.remaining_attempts(max_attempts)
                    },
                    locked_until: record.locked_until,
                }
            });
        Ok(status)
    }

    /// Discard any pending code for `(phone, purpose)`
    pub async fn invalidate(&self, phone: &str, purpose: Purpose) -> Result<bool, OtpError> {
        let phone = parse_phone(phone)?;
        let uid = derive_uid(&phone);

        let composite = self
            .otp_store
            .delete(OtpKey::composite(&uid, &phone, purpose).as_str())
            .await?;
        let legacy = self
            .otp_store
            .delete(OtpKey::legacy(&phone, purpose).as_str())
            .await?;

        tracing::info!(
            phone = %phone.masked(),
            purpose = %purpose,
            removed = composite || legacy,
            event = "otp_invalidated",
            "Invalidated pending verification code"
        );
        Ok(composite || legacy)
    }

    /// Current rate-limit usage for a phone
    pub async fn rate_limit_status(&self, phone: &str) -> Result<RateLimitStatus, OtpError> {
        let phone = parse_phone(phone)?;
        Ok(self.rate_limiter.status(&phone).await?)
    }

    /// Clear the rate-limit counters of a phone
    pub async fn reset_rate_limit(&self, phone: &str) -> Result<bool, OtpError> {
        let phone = parse_phone(phone)?;
        Ok(self.rate_limiter.reset(&phone).await?)
    }

    /// Composite key first, then the legacy key when enabled
    async fn load(
        &self,
        phone: &PhoneNumber,
        purpose: Purpose,
    ) -> DomainResult<Option<(OtpKey, Stored<OtpRecord>)>> {
        let composite = OtpKey::composite(&derive_uid(phone), phone, purpose);
        if let Some(stored) = self.otp_store.get(composite.as_str()).await? {
            return Ok(Some((composite, stored)));
        }

        if !self.config.legacy_key_fallback {
            return Ok(None);
        }

        let legacy = OtpKey::legacy(phone, purpose);
        let found = self.otp_store.get(legacy.as_str()).await?;
        if found.is_some() {
            tracing::debug!(
                phone = %phone.masked(),
                purpose = %purpose,
                event = "otp_legacy_key_hit",
                "Found verification code under legacy key"
            );
        }
        Ok(found.map(|stored| (legacy, stored)))
    }

    /// Hand the code to the gateway under a timeout, or fake it in dry-run
    async fn dispatch_sms(
        &self,
        phone: &PhoneNumber,
        purpose: Purpose,
        code: &str,
    ) -> Result<String, OtpError> {
        if self.config.dry_run {
            let message_id = format!("dry-run-{}", Uuid::new_v4());
            tracing::info!(
                phone = %phone.masked(),
                purpose = %purpose,
                message_id = %message_id,
                event = "otp_dry_run",
                "Dry-run mode, SMS not sent"
            );
            return Ok(message_id);
        }

        let message = self.config.render_message(code);
        let timeout = std::time::Duration::from_secs(self.config.sms_timeout_seconds);

        let reason = match tokio::time::timeout(timeout, self.sms.send_sms(&phone.digits(), &message)).await {
            Ok(Ok(message_id)) => return Ok(message_id),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}s", self.config.sms_timeout_seconds),
        };

        tracing::warn!(
            phone = %phone.masked(),
            purpose = %purpose,
            provider = self.sms.provider_name(),
            reason = %reason,
            event = "sms_send_failed",
            "Failed to send verification SMS"
        );
        Err(OtpError::SmsSendFailed { reason })
    }

    fn failure<T>(&self, operation: &'static str, purpose: Purpose, err: OtpError) -> OtpResponse<T> {
        if let OtpError::Internal(cause) = &err {
            tracing::error!(
                operation = operation,
                purpose = %purpose,
                error = %cause,
                event = "otp_internal_error",
                "Unexpected error in OTP flow"
            );
        }
        err.to_response(self.clock.now())
    }
}

fn parse_phone(raw: &str) -> Result<PhoneNumber, OtpError> {
    PhoneNumber::parse(raw).map_err(|e| OtpError::InvalidInput {
        message: e.to_string(),
    })
}
