//! # Session Seams
//!
//! Traits the session controller calls out through. The controller owns
//! neither sockets, timers nor any playback resource.
//!
//! ```text
//! SessionController defines:    Outer layers implement:
//! ┌──────────────────────┐      ┌──────────────────────────────┐
//! │ trait Presenter      │ ←─── │ terminal / GUI / test double │
//! │ trait SessionLinks   │ ←─── │ guardian_networking::LiveLinks│
//! └──────────────────────┘      └──────────────────────────────┘
//! ```

use std::time::Duration;

use guardian_shared::{ActionReport, JudgedEvent, Verdict};

use crate::scoring::{Attempt, SessionReport};
use crate::session::state::Mode;

// ============================================================================
// PRESENTATION
// ============================================================================

/// Receives everything the player should see.
///
/// All methods default to doing nothing.
pub trait Presenter {
    /// The mode changed. Called after any teardown has completed.
    fn mode_changed(&mut self, _from: Mode, _to: Mode) {}

    /// A challenge is now awaiting a verdict. `expected` is set in demo mode.
    fn challenge_presented(&mut self, _challenge: &JudgedEvent, _expected: Option<Verdict>) {}

    /// A verdict was judged locally.
    fn verdict_judged(&mut self, _attempt: &Attempt) {}

    /// Score or streak moved.
    fn score_changed(&mut self, _score: i64, _streak: u32, _on_fire: bool) {}

    /// The countdown moved.
    fn countdown(&mut self, _seconds_remaining: u32) {}

    /// A live session ended on time.
    fn report_ready(&mut self, _report: &SessionReport) {}
}

/// Presenter that shows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

// ============================================================================
// CHANNELS AND TIMERS
// ============================================================================

/// Control surface for the live channels and the session timers.
///
/// Every method must take effect before it returns, as far as the session is
/// concerned: after `close_channels` no message from the old channels may
/// reach the controller, after `stop_countdown` no further tick may.
pub trait SessionLinks {
    /// Opens the feed and action channels.
    fn open_channels(&mut self);

    /// Closes both channels. Idempotent.
    fn close_channels(&mut self);

    /// Queues a verdict report on the action channel.
    fn send_report(&mut self, report: ActionReport);

    /// Starts the countdown.
    fn start_countdown(&mut self, period: Duration);

    /// Stops the countdown. Idempotent.
    fn stop_countdown(&mut self);

    /// Fires one demo step after `delay`, replacing any pending one.
    fn schedule_demo_step(&mut self, delay: Duration);

    /// Cancels a pending demo step. Idempotent.
    fn cancel_demo_step(&mut self);
}

// ============================================================================
// MOCK IMPLEMENTATIONS (For Testing)
// ============================================================================

/// Everything a [`RecordingPresenter`] saw.
#[derive(Clone, Debug, PartialEq)]
pub enum PresenterEvent {
    /// `mode_changed`.
    Mode(Mode, Mode),
    /// `challenge_presented`.
    Challenge(u64, Option<Verdict>),
    /// `verdict_judged`.
    Judged(u64, bool, i64),
    /// `score_changed`.
    Score(i64, u32),
    /// `countdown`.
    Countdown(u32),
    /// `report_ready`.
    Report(SessionReport),
}

/// Presenter that records every call.
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    /// Calls, in order.
    pub events: Vec<PresenterEvent>,
}

impl RecordingPresenter {
    /// Number of transitions into `to`.
    #[must_use]
    pub fn transitions_to(&self, to: Mode) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PresenterEvent::Mode(_, t) if *t == to))
            .count()
    }
}

impl Presenter for RecordingPresenter {
    fn mode_changed(&mut self, from: Mode, to: Mode) {
        self.events.push(PresenterEvent::Mode(from, to));
    }

    fn challenge_presented(&mut self, challenge: &JudgedEvent, expected: Option<Verdict>) {
        self.events.push(PresenterEvent::Challenge(challenge.id(), expected));
    }

    fn verdict_judged(&mut self, attempt: &Attempt) {
        self.events.push(PresenterEvent::Judged(
            attempt.event().id(),
            attempt.correct(),
            attempt.points(),
        ));
    }

    fn score_changed(&mut self, score: i64, streak: u32, _on_fire: bool) {
        self.events.push(PresenterEvent::Score(score, streak));
    }

    fn countdown(&mut self, seconds_remaining: u32) {
        self.events.push(PresenterEvent::Countdown(seconds_remaining));
    }

    fn report_ready(&mut self, report: &SessionReport) {
        self.events.push(PresenterEvent::Report(*report));
    }
}

/// Links double that tracks what is open and records reports.
#[derive(Clone, Debug, Default)]
pub struct RecordingLinks {
    /// Channels currently open.
    pub channels_open: bool,
    /// Countdown running.
    pub countdown_running: bool,
    /// Period of the running countdown.
    pub countdown_period: Option<Duration>,
    /// Delay of the pending demo step.
    pub demo_step: Option<Duration>,
    /// Reports sent, in order.
    pub reports: Vec<ActionReport>,
    /// Times the channels were opened.
    pub opens: usize,
    /// Times the channels were closed while open.
    pub closes: usize,
}

impl SessionLinks for RecordingLinks {
    fn open_channels(&mut self) {
        self.channels_open = true;
        self.opens += 1;
    }

    fn close_channels(&mut self) {
        if self.channels_open {
            self.closes += 1;
        }
        self.channels_open = false;
    }

    fn send_report(&mut self, report: ActionReport) {
        if self.channels_open {
            self.reports.push(report);
        }
    }

    fn start_countdown(&mut self, period: Duration) {
        self.countdown_running = true;
        self.countdown_period = Some(period);
    }

    fn stop_countdown(&mut self) {
        self.countdown_running = false;
        self.countdown_period = None;
    }

    fn schedule_demo_step(&mut self, delay: Duration) {
        self.demo_step = Some(delay);
    }

    fn cancel_demo_step(&mut self) {
        self.demo_step = None;
    }
}
