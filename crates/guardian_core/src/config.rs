//! Session timing and capacity settings.

use std::time::Duration;

use guardian_shared::constants::{BACKLOG_CAPACITY, DEMO_STEP_DELAY_MILLIS};
use guardian_shared::{SESSION_SECONDS, TICK_MILLIS};
use serde::Deserialize;

use crate::error::{SessionError, SessionResult};

/// Configuration for a session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown length of a live session.
    pub duration_secs: u32,
    /// Countdown period in milliseconds.
    pub tick_ms: u64,
    /// Pause between a demo verdict and the next demo item.
    pub demo_step_delay_ms: u64,
    /// Feed events held back while a challenge is unresolved.
    pub backlog_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: SESSION_SECONDS,
            tick_ms: TICK_MILLIS,
            demo_step_delay_ms: DEMO_STEP_DELAY_MILLIS,
            backlog_capacity: BACKLOG_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Checks the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] for a zero duration, period or
    /// backlog capacity.
    pub fn validate(&self) -> SessionResult<()> {
        if self.duration_secs == 0 {
            return Err(SessionError::InvalidConfig("duration_secs must be > 0".into()));
        }
        if self.tick_ms == 0 {
            return Err(SessionError::InvalidConfig("tick_ms must be > 0".into()));
        }
        if self.backlog_capacity == 0 {
            return Err(SessionError::InvalidConfig("backlog_capacity must be > 0".into()));
        }
        Ok(())
    }

    /// Countdown period.
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Demo presentation delay.
    #[must_use]
    pub const fn demo_step_delay(&self) -> Duration {
        Duration::from_millis(self.demo_step_delay_ms)
    }
}
