//! Resettable inactivity deadline.

use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep_until, Instant, Sleep};

/// Default time a session may stay silent before it is dropped.
pub const INACTIVITY_PERIOD: Duration = Duration::from_secs(30);

/// A deadline that is pushed back by one full period on every reset.
#[derive(Debug)]
pub struct InactivityTimer {
    period: Duration,
    deadline: Instant,
    sleep: Pin<Box<Sleep>>,
}

impl InactivityTimer {
    /// Arm a timer that fires `period` from now.
    pub fn new(period: Duration) -> Self {
        let deadline = Instant::now() + period;
        Self {
            period,
            deadline,
            sleep: Box::pin(sleep_until(deadline)),
        }
    }

    #[cfg(test)]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Re-arm for a fresh period starting now.
    pub fn reset(&mut self) {
        self.deadline = Instant::now() + self.period;
        self.sleep.as_mut().reset(self.deadline);
    }

    /// Completes once the current deadline passes. Cancel-safe.
    pub async fn expired(&mut self) {
        self.sleep.as_mut().await;
    }
}
