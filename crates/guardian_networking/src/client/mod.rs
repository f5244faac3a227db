//! # Channel Clients
//!
//! The two WebSocket channels a live session holds open.
//!
//! ```text
//!                  ┌──────────────────────────┐
//!   /ws     ─────> │ LiveFeedClient           │ ──> JudgedEvent
//!                  └──────────────────────────┘
//!                  ┌──────────────────────────┐
//!   /action <────> │ ActionReporter           │ <── ActionReport
//!                  │   PendingReports (FIFO)  │ ──> ScoreDeltaMessage
//!                  └──────────────────────────┘
//! ```
//!
//! Both clients are cancel-safe in their receive methods: the only await
//! point is the next WebSocket frame, so they can sit in a `select!`.

mod action;
mod feed;

pub use action::{ActionReporter, PendingReports};
pub use feed::LiveFeedClient;

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{ChannelError, ChannelResult};

/// A client-side WebSocket.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens a WebSocket, giving up after `timeout`.
pub(crate) async fn open(url: &Url, timeout: Duration) -> ChannelResult<WsStream> {
    let unavailable = |reason: String| ChannelError::Unavailable {
        url: url.to_string(),
        reason,
    };

    match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(unavailable(e.to_string())),
        Err(_) => Err(unavailable(format!("no answer within {timeout:?}"))),
    }
}

/// Next text payload. Control frames are skipped.
pub(crate) async fn next_text(stream: &mut WsStream) -> ChannelResult<String> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text),
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => return Ok(text),
                Err(_) => tracing::debug!("Non-UTF-8 binary frame dropped"),
            },
            Some(Ok(Message::Close(_))) | None => return Err(ChannelError::Closed),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

/// Sends a close frame. Failures only get logged.
pub(crate) async fn shut(mut stream: WsStream, url: &Url) {
    if let Err(e) = stream.close(None).await {
        tracing::debug!("Close handshake with {} failed: {}", url, e);
    }
}
