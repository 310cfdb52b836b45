//! Owned countdown timer.
//!
//! The repeating tick lives inside this value. Cancelling drops the interval,
//! so nothing can tick afterwards; cancelling twice is fine.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Shortest period a repeating timer may use.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// `period`, raised to `MIN_PERIOD`. Tokio intervals reject a zero period.
#[must_use]
pub fn repeating_period(period: Duration) -> Duration {
    period.max(MIN_PERIOD)
}

#[derive(Debug, Default)]
pub struct Countdown {
    interval: Option<Interval>,
}

impl Countdown {
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, first tick one period from now.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let period = repeating_period(period);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval: Some(interval) }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick. Never resolves once cancelled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }
}

#[cfg(test)]
#[path = "countdown_test.rs"]
mod tests;
