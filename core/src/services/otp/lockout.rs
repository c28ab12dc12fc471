//! Attempt counting and temporary lockout

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::OtpRecord;
use crate::errors::otp_error::seconds_until;

/// What a verify attempt does to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyDecision {
    /// Past `expires_at`; delete the record
    Expired,
    /// Still locked; leave the record untouched
    Locked {
        locked_until: DateTime<Utc>,
        remaining_seconds: i64,
    },
    /// Code matched; delete the record
    Accepted,
    /// Wrong code with attempts left; persist `record`
    Rejected {
        record: OtpRecord,
        remaining_attempts: u32,
    },
    /// Wrong code that used the last attempt; persist the locked `record`
    LockedOut {
        record: OtpRecord,
        locked_until: DateTime<Utc>,
    },
}

/// Lockout rules: `max_attempts` wrong codes lock a record for
/// `lock_duration`
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lock_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lock_duration: Duration) -> Self {
        Self {
            max_attempts,
            lock_duration,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn lock_duration(&self) -> Duration {
        self.lock_duration
    }

    /// Decide the outcome of one verify attempt
    ///
    /// Expiry is checked before the lock. An elapsed lock is cleared (with
    /// attempts reset) before the attempt is counted. `matches` is the
    /// result of comparing the submitted code against `record.hash`.
    pub fn evaluate(&self, record: &OtpRecord, now: DateTime<Utc>, matches: bool) -> VerifyDecision {
        if record.is_expired(now) {
            return VerifyDecision::Expired;
        }

        let mut next = record.clone();
        if next.locked {
            if let Some(locked_until) = next.locked_until.filter(|_| next.is_locked(now)) {
                return VerifyDecision::Locked {
                    locked_until,
                    remaining_seconds: seconds_until(now, locked_until),
                };
            }
            next.unlock();
        }

        next.attempts = next.attempts.saturating_add(1);

        if matches {
            return VerifyDecision::Accepted;
        }

        if next.attempts >= self.max_attempts {
            let locked_until = now + self.lock_duration;
            next.lock(locked_until);
            VerifyDecision::LockedOut {
                record: next,
                locked_until,
            }
        } else {
            let remaining_attempts = next.remaining_attempts(self.max_attempts);
            VerifyDecision::Rejected {
                record: next,
                remaining_attempts,
            }
        }
    }
}
