//! # API Guardian
//!
//! The trainer binary's library half: configuration and the terminal
//! front end.
//!
//! ```text
//!   guardian.toml ──> GuardianConfig ──┬──> SessionConfig ─┐
//!                                      ├──> LinkConfig ────┼──> SessionDriver
//!                                      └──> DemoScript ────┘        │
//!   stdin ──> parse_command ──> UserCommand ────────────────────────┤
//!                                                                   ▼
//!                                                         TerminalPresenter
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod terminal;

pub use config::{ConfigError, ConfigResult, GuardianConfig, DEFAULT_CONFIG_FILE};
pub use terminal::{parse_command, TerminalPresenter};
