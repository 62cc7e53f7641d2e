//! Time source for the engine, swappable in tests

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Wall-clock time stamped on notifications
    fn now(&self) -> DateTime<Utc>;

    /// Pause between poll cycles
    async fn sleep(&self, duration: Duration);
}

/// Real time backed by chrono and tokio's timer
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
