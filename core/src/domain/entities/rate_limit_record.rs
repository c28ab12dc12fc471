//! Per-phone send counters

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use pv_shared::ErrorCode;

use crate::domain::value_objects::PhoneNumber;

/// A fixed-length counting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateWindow {
    Minute,
    Hour,
    Day,
}

impl RateWindow {
    /// Evaluation order: longest window first, so a denial reports the
    /// earliest time a new request can actually succeed.
    pub const EVALUATION_ORDER: [RateWindow; 3] =
        [RateWindow::Day, RateWindow::Hour, RateWindow::Minute];

    pub fn duration(&self) -> Duration {
        match self {
            RateWindow::Minute => Duration::minutes(1),
            RateWindow::Hour => Duration::hours(1),
            RateWindow::Day => Duration::days(1),
        }
    }

    /// Error code reported when this window denies a request
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RateWindow::Minute => ErrorCode::RateLimitMinute,
            RateWindow::Hour => ErrorCode::RateLimitHour,
            RateWindow::Day => ErrorCode::RateLimitDay,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateWindow::Minute => "minute",
            RateWindow::Hour => "hour",
            RateWindow::Day => "day",
        }
    }
}

/// Count of sends in the current window and when the window restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCounter {
    pub count: u32,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub reset_at: DateTime<Utc>,
}

impl WindowCounter {
    /// Empty counter for a window starting at `now`
    pub fn fresh(window: RateWindow, now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            reset_at: now + window.duration(),
        }
    }

    pub fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }
}

/// Rate-limit state of one phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub minute: WindowCounter,
    pub hour: WindowCounter,
    pub day: WindowCounter,
}

impl RateLimitRecord {
    /// Storage key: `rate_limit:{phone}`
    pub fn key(phone: &PhoneNumber) -> String {
        format!("rate_limit:{}", phone)
    }

    /// All windows empty, starting at `now`
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            minute: WindowCounter::fresh(RateWindow::Minute, now),
            hour: WindowCounter::fresh(RateWindow::Hour, now),
            day: WindowCounter::fresh(RateWindow::Day, now),
        }
    }

    pub fn window(&self, window: RateWindow) -> &WindowCounter {
        match window {
            RateWindow::Minute => &self.minute,
            RateWindow::Hour => &self.hour,
            RateWindow::Day => &self.day,
        }
    }

    fn window_mut(&mut self, window: RateWindow) -> &mut WindowCounter {
        match window {
            RateWindow::Minute => &mut self.minute,
            RateWindow::Hour => &mut self.hour,
            RateWindow::Day => &mut self.day,
        }
    }

    /// Restart every window whose reset time has passed
    ///
    /// Returns true if any window was restarted.
    pub fn reset_elapsed(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        for window in RateWindow::EVALUATION_ORDER {
            let counter = self.window_mut(window);
            if counter.is_elapsed(now) {
                *counter = WindowCounter::fresh(window, now);
                changed = true;
            }
        }
        changed
    }

    /// Count one send in every window
    pub fn increment(&mut self) {
        self.minute.count = self.minute.count.saturating_add(1);
        self.hour.count = self.hour.count.saturating_add(1);
        self.day.count = self.day.count.saturating_add(1);
    }
}
