//! # Guardian Networking - Live Channels
//!
//! Everything in API Guardian that touches a socket or a timer.
//!
//! ## Architecture
//!
//! - **Protocol**: JSON text frames, decoded into shared types
//! - **Client**: the feed channel and the action channel, one WebSocket each
//! - **Transport**: [`LiveLinks`], the channel pair scoped to live play plus
//!   the countdown and demo timers
//! - **Session**: [`SessionDriver`], the async loop feeding the controller
//!
//! ## Failure Model
//!
//! ```text
//! SERVICE                          CLIENT
//!   |                                 |
//!   |   (unreachable / drops)         | <- channel goes idle, session goes on
//!   |--- garbage frame -------------->| <- discarded, logged
//!   |--- challenge ------------------>| <- explained if no hint
//!   |<-- { id, action, real_anomaly } |
//!   |--- { points } ----------------->| <- matched by id or arrival order
//! ```
//!
//! Nothing on this side ends a session except the countdown or the player.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::{ActionReporter, LiveFeedClient, PendingReports};
pub use error::{ChannelError, ChannelResult};
pub use protocol::{decode_delta, decode_feed, encode_report};
pub use session::{SessionDriver, UserCommand};
pub use transport::{Countdown, LinkConfig, LinkEvent, LiveLinks, CONNECT_TIMEOUT_MILLIS};
