//! Action channel: verdict reports out, score deltas back.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::SinkExt;
use guardian_shared::{ActionReport, ChallengeId, ScoreDeltaMessage};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{next_text, open, shut, WsStream};
use crate::error::ChannelResult;
use crate::protocol::{decode_delta, encode_report};

/// Reports sent and still waiting for their delta.
///
/// A delta that names its challenge settles that report. A delta without an
/// id settles the oldest outstanding report.
#[derive(Clone, Debug, Default)]
pub struct PendingReports {
    ids: VecDeque<ChallengeId>,
}

impl PendingReports {
    /// Records a sent report.
    pub fn push(&mut self, id: ChallengeId) {
        self.ids.push_back(id);
    }

    /// Reports still waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Settles one report and returns the delta with its challenge id filled
    /// in where it can be.
    pub fn correlate(&mut self, delta: ScoreDeltaMessage) -> ScoreDeltaMessage {
        match delta.id {
            Some(id) => {
                match self.ids.iter().position(|pending| *pending == id) {
                    Some(position) => {
                        self.ids.remove(position);
                    }
                    None => tracing::debug!("Score delta names unreported challenge {}", id),
                }
                delta
            }
            None => {
                let id = self.ids.pop_front();
                if id.is_none() {
                    tracing::debug!("Score delta {} arrived with no report outstanding", delta.points);
                }
                ScoreDeltaMessage { id, ..delta }
            }
        }
    }
}

/// Both ends of the action channel.
pub struct ActionReporter {
    stream: WsStream,
    url: Url,
    pending: PendingReports,
}

impl ActionReporter {
    /// Connects to the action endpoint.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unavailable`](crate::ChannelError::Unavailable) if the
    /// endpoint cannot be reached within `timeout`.
    pub async fn connect(url: &Url, timeout: Duration) -> ChannelResult<Self> {
        let stream = open(url, timeout).await?;
        tracing::info!("Action channel open: {}", url);
        Ok(Self {
            stream,
            url: url.clone(),
            pending: PendingReports::default(),
        })
    }

    /// Sends one verdict report.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Transport`](crate::ChannelError::Transport) if the
    /// frame could not be written.
    pub async fn send(&mut self, report: &ActionReport) -> ChannelResult<()> {
        let text = encode_report(report)?;
        self.stream.send(Message::Text(text)).await?;
        self.pending.push(report.id);
        tracing::debug!("Reported {} for challenge {}", report.action, report.id);
        Ok(())
    }

    /// Waits for the next score delta, correlated to its report.
    /// Malformed replies are discarded. Cancel-safe.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`](crate::ChannelError::Closed) or
    /// [`ChannelError::Transport`](crate::ChannelError::Transport) once the
    /// channel is gone.
    pub async fn next_delta(&mut self) -> ChannelResult<ScoreDeltaMessage> {
        loop {
            let text = next_text(&mut self.stream).await?;
            match decode_delta(&text) {
                Ok(delta) => return Ok(self.pending.correlate(delta)),
                Err(e) => tracing::warn!("Malformed action reply discarded: {}", e),
            }
        }
    }

    /// Reports still waiting for a delta.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Closes the channel. Outstanding reports are forgotten.
    pub async fn close(self) {
        tracing::info!(
            "Action channel closed: {} ({} reports unanswered)",
            self.url,
            self.pending.len()
        );
        shut(self.stream, &self.url).await;
    }
}
