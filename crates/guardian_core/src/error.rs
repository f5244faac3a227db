//! # Session Error Types
//!
//! Errors the session engine reports to its caller. Channel failures,
//! malformed messages, stale verdicts and countdown races are NOT errors
//! here: they are absorbed and logged where they happen.

use guardian_shared::{ChallengeId, Verdict};
use thiserror::Error;

use crate::session::Mode;

/// Errors that can occur in the session engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The requested mode change is not an edge of the state machine.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Mode the session was in.
        from: Mode,
        /// Mode that was requested.
        to: Mode,
    },

    /// Invalid session configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The demo script has no items.
    #[error("demo script is empty")]
    EmptyScript,

    /// A demo item's expected verdict disagrees with its own label.
    #[error("demo item {id}: expected verdict {expected} contradicts its label")]
    ScriptContradiction {
        /// Offending item.
        id: ChallengeId,
        /// The verdict the script expects.
        expected: Verdict,
    },
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
