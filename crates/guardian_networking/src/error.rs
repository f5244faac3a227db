//! # Channel Error Types
//!
//! None of these end a session. The link layer logs them and treats the
//! channel as idle.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors on the feed and action channels.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The endpoint could not be reached.
    #[error("channel unavailable at {url}: {reason}")]
    Unavailable {
        /// Endpoint that failed.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// A message could not be decoded.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The peer closed the channel.
    #[error("channel closed")]
    Closed,

    /// WebSocket protocol or I/O failure on an open channel.
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// An endpoint URL is unusable.
    #[error("invalid endpoint url {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
