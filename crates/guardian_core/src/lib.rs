//! # Guardian Core - The Session Engine
//!
//! Everything in API Guardian that has state, ordering or correctness rules.
//!
//! ## Architecture
//!
//! ```text
//!   user verdicts ──┐
//!   countdown ──────┤      ┌────────────────────┐      ┌──────────────┐
//!   feed channel ───┼────> │ SessionController  │ ───> │  Presenter   │
//!   action channel ─┘      │ (single mutation   │      └──────────────┘
//!                          │  point)            │      ┌──────────────┐
//!                          │                    │ ───> │ SessionLinks │
//!                          └─────────┬──────────┘      └──────────────┘
//!                                    │
//!              ┌─────────────────────┼─────────────────────┐
//!              ▼                     ▼                     ▼
//!       ScoringEngine        HeuristicExplainer     DemoScriptPlayer
//! ```
//!
//! The controller never touches a socket or a timer directly. It asks the
//! [`SessionLinks`] seam to open, close, send and schedule, and tells the
//! [`Presenter`] seam what the player should see.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod demo;
pub mod error;
pub mod explainer;
pub mod scoring;
pub mod session;

pub use config::SessionConfig;
pub use demo::{DemoEntry, DemoItem, DemoScript, DemoScriptFile, DemoScriptPlayer, DemoStep, ScriptMismatch};
pub use error::{SessionError, SessionResult};
pub use explainer::{Explanation, HeuristicExplainer, Indication, Rule};
pub use scoring::{Attempt, Rank, ScoringEngine, ScorePolicy, SessionReport, Tally};
pub use session::{
    Intake, Mode, NullPresenter, Presenter, PresenterEvent, RecordingLinks, RecordingPresenter,
    SessionController, SessionLinks, SessionState,
};
