//! # Countdown
//!
//! Fixed-period session clock. Each tick is one event into the session
//! controller; the controller owns the remaining-seconds counter.
//!
//! ## Design
//!
//! - First tick one full period after start, never immediately
//! - Late ticks are delivered in a burst so wall time is kept
//! - `tick()` is cancel-safe

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Periodic tick source.
pub struct Countdown {
    /// Underlying timer.
    interval: Interval,
    /// Tick period.
    period: Duration,
    /// Ticks delivered so far.
    tick_count: u64,
}

impl Countdown {
    /// Starts ticking every `period`. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        Self {
            interval,
            period,
            tick_count: 0,
        }
    }

    /// Waits for the next tick.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
        self.tick_count += 1;
    }

    /// Ticks delivered so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Tick period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}
