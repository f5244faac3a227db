//! # Session & Network Constants
//!
//! Defaults for the live service endpoints and the session rules.
//!
//! **NOTE:** The endpoint values are only defaults. The binary reads the
//! real ones from its config file.

// =============================================================================
// NETWORK CONFIGURATION
// =============================================================================

/// Base URL of the labeling service.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8000";

/// Path of the feed channel (server pushes challenges).
pub const FEED_PATH: &str = "/ws";

/// Path of the action channel (client reports verdicts, server replies with points).
pub const ACTION_PATH: &str = "/action";

// =============================================================================
// SESSION RULES
// =============================================================================

/// Length of a live session in countdown units.
pub const SESSION_SECONDS: u32 = 60;

/// Countdown period in milliseconds (1 Hz).
pub const TICK_MILLIS: u64 = 1000;

/// Points for a correct verdict.
pub const POINTS_CORRECT: i64 = 100;

/// Points for an incorrect verdict.
pub const POINTS_INCORRECT: i64 = -50;

/// Delay between a demo verdict and the next scripted item.
pub const DEMO_STEP_DELAY_MILLIS: u64 = 600;

/// Maximum number of feed events queued behind an unresolved challenge.
pub const BACKLOG_CAPACITY: usize = 8;

/// Streak length above which the player is "on fire".
pub const HOT_STREAK_ABOVE: u32 = 2;
