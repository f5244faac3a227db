//! # Guardian Shared
//!
//! Common types used by the session engine, the channel layer and the
//! binary.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `tokio`
//! - `tokio-tungstenite`
//! - Anything that opens a socket
//!
//! If you need I/O, put it in `guardian_networking`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod model;
pub mod protocol;

pub use constants::{
    ACTION_PATH, DEFAULT_SERVER_URL, FEED_PATH, POINTS_CORRECT, POINTS_INCORRECT,
    SESSION_SECONDS, TICK_MILLIS,
};
pub use model::{ChallengeEvent, ChallengeId, JudgedEvent, Label, Verdict};
pub use protocol::{ActionReport, FeedMessage, RequestFields, ScoreDeltaMessage};
