//! Per-phone send quotas over minute, hour and day windows

use chrono::{DateTime, Utc};
use std::sync::Arc;

use pv_shared::RateLimitConfig;

use crate::domain::entities::{RateLimitRecord, RateWindow};
use crate::domain::value_objects::PhoneNumber;
use crate::errors::otp_error::seconds_until;
use crate::errors::{DomainError, DomainResult};
use crate::repositories::{RecordStore, Stored};

use super::clock::Clock;
use super::types::{RateLimitCheck, RateLimitStatus, WindowStatus};

/// Compare-and-swap attempts before an increment gives up
const MAX_INCREMENT_RETRIES: usize = 8;

/// Rate limiter backed by a record store
///
/// `check` never writes; quota is only charged by `increment`, which the
/// dispatcher calls after the SMS has been handed to the gateway.
pub struct RateLimiter<L: ?Sized> {
    store: Arc<L>,
    limits: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl<L> RateLimiter<L>
where
    L: RecordStore<RateLimitRecord> + ?Sized,
{
    pub fn new(store: Arc<L>, limits: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            limits,
            clock,
        }
    }

    pub(crate) fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self { clock, ..self }
    }

    pub fn limits(&self) -> &RateLimitConfig {
        &self.limits
    }

    /// Check whether `phone` may be sent another code
    ///
    /// Elapsed windows are treated as empty. Windows are evaluated day, hour,
    /// minute; the first one at its limit denies the request.
    pub async fn check(&self, phone: &PhoneNumber) -> DomainResult<RateLimitCheck> {
        let now = self.clock.now();
        let stored = self.store.get(&RateLimitRecord::key(phone)).await?;
        let observed_revision = stored.as_ref().map(|s| s.revision);
        let snapshot = current_counters(stored, now);

        let denied = RateWindow::EVALUATION_ORDER
            .into_iter()
            .find(|window| snapshot.window(*window).count >= limit_for(&self.limits, *window));

        let check = match denied {
            Some(window) => {
                let reset_at = snapshot.window(window).reset_at;
                let retry_after = seconds_until(now, reset_at);
                tracing::warn!(
                    phone = %phone.masked(),
                    window = window.as_str(),
                    retry_after_seconds = retry_after,
                    event = "rate_limit_exceeded",
                    "Verification code request rate limit exceeded"
                );
                RateLimitCheck {
                    allowed: false,
                    exceeded: Some(window),
                    reset_at: Some(reset_at),
                    retry_after_seconds: Some(retry_after),
                    message: Some(wait_message(retry_after)),
                    limits: self.limits.clone(),
                    observed_revision,
                    snapshot,
                }
            }
            None => RateLimitCheck {
                allowed: true,
                exceeded: None,
                reset_at: None,
                retry_after_seconds: None,
                message: None,
                limits: self.limits.clone(),
                observed_revision,
                snapshot,
            },
        };
        Ok(check)
    }

    /// Charge one send against every window
    ///
    /// The first attempt commits against the counters `check` read; on
    /// conflict the record is re-read. Returns the committed counters.
    pub async fn increment(
        &self,
        phone: &PhoneNumber,
        check: &RateLimitCheck,
    ) -> DomainResult<RateLimitRecord> {
        let key = RateLimitRecord::key(phone);
        let mut expected = check.observed_revision;
        let mut record = check.snapshot.clone();

        for attempt in 0..MAX_INCREMENT_RETRIES {
            if attempt > 0 {
                let stored = self.store.get(&key).await?;
                expected = stored.as_ref().map(|s| s.revision);
                record = stored
                    .map(|s| s.value)
                    .unwrap_or_else(|| RateLimitRecord::fresh(self.clock.now()));
            }

            record.reset_elapsed(self.clock.now());
            record.increment();

            if self.store.compare_and_swap(&key, expected, Some(&record)).await? {
                tracing::debug!(
                    phone = %phone.masked(),
                    minute = record.minute.count,
                    hour = record.hour.count,
                    day = record.day.count,
                    event = "rate_limit_charged",
                    "Charged rate limit quota"
                );
                return Ok(record);
            }
        }

        Err(DomainError::Conflict {
            message: "rate limit counters kept changing during increment".to_string(),
        })
    }

    /// Current usage without writing
    pub async fn status(&self, phone: &PhoneNumber) -> DomainResult<RateLimitStatus> {
        let now = self.clock.now();
        let stored = self.store.get(&RateLimitRecord::key(phone)).await?;
        let record = current_counters(stored, now);

        let window_status = |window: RateWindow| {
            let counter = record.window(window);
            let limit = limit_for(&self.limits, window);
            WindowStatus {
                window,
                count: counter.count,
                limit,
                remaining: limit.saturating_sub(counter.count),
                reset_at: counter.reset_at,
            }
        };

        Ok(RateLimitStatus {
            minute: window_status(RateWindow::Minute),
            hour: window_status(RateWindow::Hour),
            day: window_status(RateWindow::Day),
        })
    }

    /// Clear the counters of a phone
    pub async fn reset(&self, phone: &PhoneNumber) -> DomainResult<bool> {
        let removed = self.store.delete(&RateLimitRecord::key(phone)).await?;
        tracing::info!(
            phone = %phone.masked(),
            removed = removed,
            event = "rate_limit_reset",
            "Reset rate limit counters"
        );
        Ok(removed)
    }
}

/// Counters as of `now`, with elapsed windows restarted
fn current_counters(stored: Option<Stored<RateLimitRecord>>, now: DateTime<Utc>) -> RateLimitRecord {
    match stored {
        Some(stored) => {
            let mut record = stored.value;
            record.reset_elapsed(now);
            record
        }
        None => RateLimitRecord::fresh(now),
    }
}

fn limit_for(limits: &RateLimitConfig, window: RateWindow) -> u32 {
    match window {
        RateWindow::Minute => limits.per_minute,
        RateWindow::Hour => limits.per_hour,
        RateWindow::Day => limits.per_day,
    }
}

/// Human-readable wait, e.g. "Please wait 45 seconds before requesting a new code"
fn wait_message(seconds: i64) -> String {
    let wait = if seconds < 120 {
        format!("{} seconds", seconds)
    } else if seconds < 2 * 3600 {
        format!("{} minutes", (seconds + 59) / 60)
    } else {
        format!("{} hours", (seconds + 3599) / 3600)
    };
    format!("Please wait {} before requesting a new code", wait)
}
