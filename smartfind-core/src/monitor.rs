//! Liveness bookkeeping
//!
//! Two tiny pieces of process-lifetime state: consecutive login failures
//! and the date of the last daily heartbeat.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// Counts consecutive failed logins
///
/// Crossing the threshold raises one alarm and restarts the count, so a
/// portal outage produces one alert per `threshold` failures rather than
/// one per cycle.
#[derive(Debug, Clone)]
pub struct LoginFailureCounter {
    count: u32,
    threshold: u32,
}

impl LoginFailureCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn record_success(&mut self) {
        self.count = 0;
    }

    /// Records a failure; returns the failure count when it trips the alarm
    pub fn record_failure(&mut self) -> Option<u32> {
        self.count += 1;
        if self.count >= self.threshold {
            let tripped = self.count;
            self.count = 0;
            Some(tripped)
        } else {
            None
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Last date a daily heartbeat went out
#[derive(Debug, Clone, Default)]
pub struct HeartbeatMarker {
    last_sent: Option<NaiveDate>,
    earliest_hour: u32,
}

impl HeartbeatMarker {
    pub fn new(earliest_hour: u32) -> Self {
        Self {
            last_sent: None,
            earliest_hour,
        }
    }

    /// True when no heartbeat went out today and the hour has come
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now.hour() >= self.earliest_hour && self.last_sent != Some(now.date())
    }

    pub fn mark_sent(&mut self, date: NaiveDate) {
        self.last_sent = Some(date);
    }

    pub fn last_sent(&self) -> Option<NaiveDate> {
        self.last_sent
    }
}
