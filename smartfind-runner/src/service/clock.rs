//! Time source
//!
//! The poller and the claim protocol read the time and sleep only through
//! [`Clock`], so tests can drive them with a manual clock.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Local wall-clock time
    fn now(&self) -> NaiveDateTime;

    async fn sleep(&self, duration: Duration);
}

/// Local time and tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
