//! # Live Links
//!
//! The [`SessionLinks`] implementation for live play: a feed/action channel
//! pair scoped to the `Playing` mode, the countdown, and the demo timer.
//!
//! ## Two-phase I/O
//!
//! The controller calls [`SessionLinks`] synchronously. Those calls only
//! change what [`LiveLinks::next_event`] listens to and queue work:
//!
//! ```text
//! controller call        immediate effect               settle()
//! ─────────────────────  ─────────────────────────────  ─────────────────────
//! open_channels          mark open pending              connect both
//! close_channels         stop listening, retire both    close handshakes
//! send_report            queue report                   write to action ch.
//! start/stop_countdown   timer on/off                   -
//! schedule/cancel demo   timer on/off                   -
//! ```
//!
//! Because a retired channel is no longer polled, nothing from it can reach
//! the controller once `close_channels` has returned.

mod countdown;

pub use countdown::Countdown;

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use guardian_core::{HeuristicExplainer, SessionLinks};
use guardian_shared::{ActionReport, JudgedEvent, ScoreDeltaMessage, ACTION_PATH, DEFAULT_SERVER_URL, FEED_PATH};
use serde::Deserialize;
use tokio::time::Sleep;
use url::Url;

use crate::client::{ActionReporter, LiveFeedClient};
use crate::error::{ChannelError, ChannelResult};

/// Default connect timeout in milliseconds.
pub const CONNECT_TIMEOUT_MILLIS: u64 = 3000;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Where the live channels live.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Service base URL (`ws://` or `wss://`).
    pub base_url: String,
    /// Feed channel path.
    pub feed_path: String,
    /// Action channel path.
    pub action_path: String,
    /// How long to wait for each channel to open.
    pub connect_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_owned(),
            feed_path: FEED_PATH.to_owned(),
            action_path: ACTION_PATH.to_owned(),
            connect_timeout_ms: CONNECT_TIMEOUT_MILLIS,
        }
    }
}

impl LinkConfig {
    /// Settings pointing at `base_url` with the default paths.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Full feed channel URL.
    ///
    /// # Errors
    ///
    /// [`ChannelError::InvalidUrl`] for an unparseable URL or a scheme other
    /// than `ws`/`wss`.
    pub fn feed_url(&self) -> ChannelResult<Url> {
        self.endpoint(&self.feed_path)
    }

    /// Full action channel URL.
    ///
    /// # Errors
    ///
    /// See [`LinkConfig::feed_url`].
    pub fn action_url(&self) -> ChannelResult<Url> {
        self.endpoint(&self.action_path)
    }

    /// Checks both endpoints.
    ///
    /// # Errors
    ///
    /// See [`LinkConfig::feed_url`].
    pub fn validate(&self) -> ChannelResult<()> {
        self.feed_url()?;
        self.action_url()?;
        Ok(())
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn endpoint(&self, path: &str) -> ChannelResult<Url> {
        let invalid = |reason: String| ChannelError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason,
        };

        let base = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "ws" | "wss") {
            return Err(invalid(format!("unsupported scheme {:?}", base.scheme())));
        }
        base.join(path).map_err(|e| invalid(e.to_string()))
    }
}

// ============================================================================
// EVENTS
// ============================================================================

/// Something the session controller must handle.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    /// The countdown ticked.
    Tick,
    /// A challenge arrived on the feed.
    Challenge(JudgedEvent),
    /// A score delta arrived on the action channel.
    ScoreDelta(ScoreDeltaMessage),
    /// The pending demo step is due.
    DemoStep,
}

enum Polled {
    Tick,
    Feed(ChannelResult<JudgedEvent>),
    Action(ChannelResult<ScoreDeltaMessage>),
    DemoStep,
}

// ============================================================================
// LIVE LINKS
// ============================================================================

/// Channels and timers for a real session.
pub struct LiveLinks {
    config: LinkConfig,
    explainer: HeuristicExplainer,
    feed: Option<LiveFeedClient>,
    action: Option<ActionReporter>,
    open_requested: bool,
    outbox: Vec<ActionReport>,
    retired_feeds: Vec<LiveFeedClient>,
    retired_actions: Vec<ActionReporter>,
    countdown: Option<Countdown>,
    demo_step: Option<Pin<Box<Sleep>>>,
}

impl LiveLinks {
    /// Creates idle links.
    #[must_use]
    pub fn new(config: LinkConfig, explainer: HeuristicExplainer) -> Self {
        Self {
            config,
            explainer,
            feed: None,
            action: None,
            open_requested: false,
            outbox: Vec::new(),
            retired_feeds: Vec::new(),
            retired_actions: Vec::new(),
            countdown: None,
            demo_step: None,
        }
    }

    /// Link settings.
    #[must_use]
    pub const fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// True while the feed channel is connected.
    #[must_use]
    pub const fn feed_connected(&self) -> bool {
        self.feed.is_some()
    }

    /// True while the action channel is connected.
    #[must_use]
    pub const fn action_connected(&self) -> bool {
        self.action.is_some()
    }

    /// True while the countdown runs.
    #[must_use]
    pub const fn countdown_running(&self) -> bool {
        self.countdown.is_some()
    }

    /// True while a demo step is pending.
    #[must_use]
    pub const fn demo_step_pending(&self) -> bool {
        self.demo_step.is_some()
    }

    /// Performs the I/O queued by the last controller calls: close retired
    /// channels, open requested ones, flush reports.
    pub async fn settle(&mut self) {
        for feed in self.retired_feeds.drain(..) {
            feed.close().await;
        }
        for action in self.retired_actions.drain(..) {
            action.close().await;
        }

        if self.open_requested {
            self.open_requested = false;
            self.connect().await;
        }

        let reports = std::mem::take(&mut self.outbox);
        if reports.is_empty() {
            return;
        }
        let Some(action) = self.action.as_mut() else {
            tracing::debug!("Action channel down, {} reports dropped", reports.len());
            return;
        };

        let mut failure = None;
        for report in &reports {
            if let Err(e) = action.send(report).await {
                failure = Some(e);
                break;
            }
        }
        if let Some(e) = failure {
            tracing::warn!("Action channel failed, going idle: {}", e);
            if let Some(dead) = self.action.take() {
                dead.close().await;
            }
        }
    }

    /// Waits for the next event from any live source. Cancel-safe.
    ///
    /// A channel that closes or fails is dropped and the wait continues, so
    /// with nothing running this never returns.
    pub async fn next_event(&mut self) -> LinkEvent {
        loop {
            let polled = tokio::select! {
                () = countdown_tick(&mut self.countdown) => Polled::Tick,
                received = next_challenge(&mut self.feed) => Polled::Feed(received),
                received = next_delta(&mut self.action) => Polled::Action(received),
                () = demo_due(&mut self.demo_step) => Polled::DemoStep,
            };

            match polled {
                Polled::Tick => return LinkEvent::Tick,
                Polled::Feed(Ok(challenge)) => return LinkEvent::Challenge(challenge),
                Polled::Action(Ok(delta)) => return LinkEvent::ScoreDelta(delta),
                Polled::DemoStep => {
                    self.demo_step = None;
                    return LinkEvent::DemoStep;
                }
                Polled::Feed(Err(e)) => {
                    tracing::warn!("Feed channel lost, feed is idle: {}", e);
                    self.feed = None;
                }
                Polled::Action(Err(e)) => {
                    tracing::warn!("Action channel lost, reports will be dropped: {}", e);
                    self.action = None;
                }
            }
        }
    }

    async fn connect(&mut self) {
        let timeout = self.config.connect_timeout();

        self.feed = match self.config.feed_url() {
            Ok(url) => match LiveFeedClient::connect(&url, timeout, self.explainer.clone()).await {
                Ok(feed) => Some(feed),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };

        self.action = match self.config.action_url() {
            Ok(url) => match ActionReporter::connect(&url, timeout).await {
                Ok(action) => Some(action),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };
    }
}

impl SessionLinks for LiveLinks {
    fn open_channels(&mut self) {
        self.open_requested = true;
        self.outbox.clear();
    }

    fn close_channels(&mut self) {
        self.open_requested = false;
        self.outbox.clear();
        if let Some(feed) = self.feed.take() {
            self.retired_feeds.push(feed);
        }
        if let Some(action) = self.action.take() {
            self.retired_actions.push(action);
        }
    }

    fn send_report(&mut self, report: ActionReport) {
        if self.action.is_some() || self.open_requested {
            self.outbox.push(report);
        } else {
            tracing::debug!("Action channel down, report for {} dropped", report.id);
        }
    }

    fn start_countdown(&mut self, period: Duration) {
        self.countdown = Some(Countdown::start(period));
    }

    fn stop_countdown(&mut self) {
        self.countdown = None;
    }

    fn schedule_demo_step(&mut self, delay: Duration) {
        self.demo_step = Some(Box::pin(tokio::time::sleep(delay)));
    }

    fn cancel_demo_step(&mut self) {
        self.demo_step = None;
    }
}

async fn countdown_tick(countdown: &mut Option<Countdown>) {
    match countdown {
        Some(countdown) => countdown.tick().await,
        None => pending().await,
    }
}

async fn next_challenge(feed: &mut Option<LiveFeedClient>) -> ChannelResult<JudgedEvent> {
    match feed {
        Some(feed) => feed.next_challenge().await,
        None => pending().await,
    }
}

async fn next_delta(action: &mut Option<ActionReporter>) -> ChannelResult<ScoreDeltaMessage> {
    match action {
        Some(action) => action.next_delta().await,
        None => pending().await,
    }
}

async fn demo_due(step: &mut Option<Pin<Box<Sleep>>>) {
    match step {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = LinkConfig::default();
        assert_eq!(config.feed_url().unwrap().as_str(), "ws://127.0.0.1:8000/ws");
        assert_eq!(config.action_url().unwrap().as_str(), "ws://127.0.0.1:8000/action");
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_bad_endpoints_rejected() {
        for base in ["http://127.0.0.1:8000", "not a url", ""] {
            let config = LinkConfig::with_base_url(base);
            assert!(matches!(config.validate(), Err(ChannelError::InvalidUrl { .. })), "{base}");
        }
    }

    #[test]
    fn test_partial_toml() {
        let config: LinkConfig = toml::from_str(r#"base_url = "wss://guardian.example""#).unwrap();
        assert_eq!(config.feed_url().unwrap().as_str(), "wss://guardian.example/ws");
        assert_eq!(config.action_path, "/action");
    }

    #[tokio::test]
    async fn test_wss_endpoint_negotiates_tls() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hang up, so the TLS handshake fails on the wire.
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let config = LinkConfig {
            connect_timeout_ms: 2000,
            ..LinkConfig::with_base_url(format!("wss://{addr}"))
        };
        config.validate().unwrap();
        let url = config.feed_url().unwrap();

        match LiveFeedClient::connect(&url, config.connect_timeout(), HeuristicExplainer::new()).await {
            Err(ChannelError::Unavailable { reason, .. }) => {
                assert!(!reason.contains("TLS support not compiled in"), "{reason}");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("handshake against a plain socket succeeded"),
        }
    }

    #[tokio::test]
    async fn test_reports_dropped_while_closed() {
        let mut links = LiveLinks::new(LinkConfig::default(), HeuristicExplainer::new());
        links.send_report(ActionReport {
            id: 1,
            action: guardian_shared::Verdict::Block,
            real_anomaly: true,
        });
        assert!(links.outbox.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_idle() {
        let mut links = LiveLinks::new(
            LinkConfig {
                connect_timeout_ms: 500,
                ..LinkConfig::with_base_url("ws://127.0.0.1:9")
            },
            HeuristicExplainer::new(),
        );
        links.open_channels();
        links.settle().await;

        assert!(!links.feed_connected());
        assert!(!links.action_connected());
    }

    #[tokio::test]
    async fn test_timers_produce_events() {
        let mut links = LiveLinks::new(LinkConfig::default(), HeuristicExplainer::new());

        links.schedule_demo_step(Duration::from_millis(5));
        assert_eq!(links.next_event().await, LinkEvent::DemoStep);
        assert!(!links.demo_step_pending());

        links.start_countdown(Duration::from_millis(5));
        assert_eq!(links.next_event().await, LinkEvent::Tick);
        links.stop_countdown();
        assert!(!links.countdown_running());
    }

    #[tokio::test]
    async fn test_cancelled_demo_step_never_fires() {
        let mut links = LiveLinks::new(LinkConfig::default(), HeuristicExplainer::new());
        links.schedule_demo_step(Duration::from_millis(5));
        links.cancel_demo_step();

        let waited = tokio::time::timeout(Duration::from_millis(50), links.next_event()).await;
        assert!(waited.is_err());
    }
}
