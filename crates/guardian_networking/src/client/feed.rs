//! Feed channel: one challenge per message, server push only.

use std::time::Duration;

use guardian_core::HeuristicExplainer;
use guardian_shared::JudgedEvent;
use url::Url;

use super::{next_text, open, shut, WsStream};
use crate::error::ChannelResult;
use crate::protocol::decode_feed;

/// Receiving end of the feed channel.
pub struct LiveFeedClient {
    stream: WsStream,
    url: Url,
    explainer: HeuristicExplainer,
    received: u64,
    malformed: u64,
}

impl LiveFeedClient {
    /// Connects to the feed endpoint.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unavailable`](crate::ChannelError::Unavailable) if the
    /// endpoint cannot be reached within `timeout`.
    pub async fn connect(url: &Url, timeout: Duration, explainer: HeuristicExplainer) -> ChannelResult<Self> {
        let stream = open(url, timeout).await?;
        tracing::info!("Feed channel open: {}", url);
        Ok(Self {
            stream,
            url: url.clone(),
            explainer,
            received: 0,
            malformed: 0,
        })
    }

    /// Waits for the next well-formed challenge. Malformed messages are
    /// discarded. Cancel-safe.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`](crate::ChannelError::Closed) or
    /// [`ChannelError::Transport`](crate::ChannelError::Transport) once the
    /// channel is gone.
    pub async fn next_challenge(&mut self) -> ChannelResult<JudgedEvent> {
        loop {
            let text = next_text(&mut self.stream).await?;
            match decode_feed(&text, &self.explainer) {
                Ok(challenge) => {
                    self.received += 1;
                    return Ok(challenge);
                }
                Err(e) => {
                    self.malformed += 1;
                    tracing::warn!("Malformed feed message discarded: {}", e);
                }
            }
        }
    }

    /// Challenges decoded so far.
    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Messages discarded so far.
    #[must_use]
    pub const fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Closes the channel.
    pub async fn close(self) {
        tracing::info!(
            "Feed channel closed: {} ({} challenges, {} malformed)",
            self.url,
            self.received,
            self.malformed
        );
        shut(self.stream, &self.url).await;
    }
}
