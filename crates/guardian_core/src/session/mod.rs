//! # Session Controller
//!
//! The orchestrating state machine. Every event source (user verdicts, the
//! countdown, the feed channel, the action channel, the demo timer) lands on
//! one of the methods below, and nothing else mutates session state.
//!
//! ## Rules
//!
//! - At most one challenge is outstanding. Feed events arriving while one is
//!   unresolved wait in a bounded backlog; they never overwrite it.
//! - A verdict with nothing outstanding is ignored (stale verdict).
//! - Reaching zero on the countdown leaves `Playing` exactly once; an
//!   unresolved challenge at that moment is dropped without an attempt.
//! - Leaving `Playing` closes both channels and stops the countdown before
//!   the presenter hears about the new mode.

pub mod presenter;
pub mod state;

use std::collections::{HashSet, VecDeque};

use guardian_shared::{ActionReport, ChallengeId, JudgedEvent, ScoreDeltaMessage, Verdict};

use crate::config::SessionConfig;
use crate::demo::{DemoScript, DemoScriptPlayer, DemoStep};
use crate::error::{SessionError, SessionResult};
use crate::explainer::HeuristicExplainer;
use crate::scoring::{Attempt, ScoringEngine, SessionReport};

pub use presenter::{
    NullPresenter, Presenter, PresenterEvent, RecordingLinks, RecordingPresenter, SessionLinks,
};
pub use state::{Intake, Mode, SessionState};

/// The session state machine.
pub struct SessionController<P: Presenter, L: SessionLinks> {
    /// Timing and capacity settings.
    config: SessionConfig,
    /// Rule table, used to validate the demo script.
    explainer: HeuristicExplainer,
    /// Injected demo data.
    script: DemoScript,
    /// Where the player's view goes.
    presenter: P,
    /// Channels and timers.
    links: L,
    /// The current session.
    state: SessionState,
    /// Scoring policy of the current session.
    engine: ScoringEngine,
    /// Demo cursor, only in `Demo`.
    demo: Option<DemoScriptPlayer>,
    /// Feed events waiting behind the current challenge.
    backlog: VecDeque<JudgedEvent>,
    /// Ids resolved this session.
    resolved: HashSet<ChallengeId>,
}

impl<P: Presenter, L: SessionLinks> SessionController<P, L> {
    /// Creates a controller in `Welcome`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConfig`] if the config does not validate.
    pub fn new(config: SessionConfig, script: DemoScript, presenter: P, links: L) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            explainer: HeuristicExplainer::new(),
            script,
            presenter,
            links,
            state: SessionState::default(),
            engine: ScoringEngine::local(),
            demo: None,
            backlog: VecDeque::new(),
            resolved: HashSet::new(),
        })
    }

    /// Replaces the rule table used for demo validation.
    #[must_use]
    pub fn with_explainer(mut self, explainer: HeuristicExplainer) -> Self {
        self.explainer = explainer;
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Session settings.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The presenter.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The presenter, mutably.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// The links.
    #[must_use]
    pub const fn links(&self) -> &L {
        &self.links
    }

    /// The links, mutably. Used by the driver to pull events.
    pub fn links_mut(&mut self) -> &mut L {
        &mut self.links
    }

    /// The demo cursor while in `Demo`.
    #[must_use]
    pub const fn demo_player(&self) -> Option<&DemoScriptPlayer> {
        self.demo.as_ref()
    }

    /// Feed events waiting behind the current challenge.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Summary of the finished session, only in `Report`.
    #[must_use]
    pub fn report(&self) -> Option<SessionReport> {
        (self.state.mode == Mode::Report).then(|| SessionReport::from_tally(&self.state.tally))
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Starts a live session: fresh state, channels open, countdown running.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidTransition`] unless in `Welcome`.
    pub fn start_live(&mut self) -> SessionResult<()> {
        self.check(Mode::Playing)?;
        self.reset(Mode::Playing, self.config.duration_secs, ScoringEngine::remote());

        self.links.open_channels();
        self.links.start_countdown(self.config.tick_period());

        self.announce(Mode::Welcome, Mode::Playing);
        self.presenter.countdown(self.state.seconds_remaining);
        Ok(())
    }

    /// Starts the scripted demo at item 0.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidTransition`] unless in `Welcome`,
    /// [`SessionError::EmptyScript`] with an empty script.
    pub fn start_demo(&mut self) -> SessionResult<()> {
        self.check(Mode::Demo)?;
        if self.script.is_empty() {
            return Err(SessionError::EmptyScript);
        }

        for mismatch in self.script.validate(&self.explainer) {
            tracing::warn!(
                "Demo item {} rationale {:?} differs from rule table {:?}",
                mismatch.id,
                mismatch.canned,
                mismatch.derived
            );
        }

        self.reset(Mode::Demo, 0, ScoringEngine::local());
        self.demo = Some(DemoScriptPlayer::new(self.script.clone()));

        self.announce(Mode::Welcome, Mode::Demo);
        self.present_demo_item();
        Ok(())
    }

    /// Offers a challenge from the feed.
    pub fn receive_challenge(&mut self, challenge: JudgedEvent) -> Intake {
        if self.state.mode != Mode::Playing {
            tracing::debug!("Challenge {} ignored in {}", challenge.id(), self.state.mode);
            return Intake::Ignored;
        }

        let id = challenge.id();
        let outstanding = self.state.current.as_ref().is_some_and(|c| c.id() == id);
        if outstanding || self.resolved.contains(&id) || self.backlog.iter().any(|c| c.id() == id) {
            tracing::debug!("Duplicate challenge {} dropped", id);
            return Intake::Duplicate;
        }

        if self.state.current.is_none() {
            self.present(challenge);
            return Intake::Presented;
        }

        if self.backlog.len() >= self.config.backlog_capacity {
            if let Some(dropped) = self.backlog.pop_front() {
                tracing::warn!("Backlog full, dropping queued challenge {}", dropped.id());
            }
        }
        self.backlog.push_back(challenge);
        Intake::Queued
    }

    /// Judges the outstanding challenge.
    ///
    /// Returns the new attempt, or `None` for a stale verdict.
    pub fn submit_verdict(&mut self, verdict: Verdict) -> Option<&Attempt> {
        let Some(challenge) = self.state.current.take() else {
            tracing::debug!("Stale verdict {} ignored: no challenge outstanding", verdict);
            return None;
        };

        let report = ActionReport {
            id: challenge.id(),
            action: verdict,
            real_anomaly: challenge.label.is_anomaly,
        };
        self.resolved.insert(challenge.id());

        let attempt = Attempt::judge(challenge, verdict);
        self.presenter.verdict_judged(&attempt);

        let tally = std::mem::take(&mut self.state.tally);
        self.state.tally = self.engine.apply(tally, attempt);
        self.presenter
            .score_changed(self.state.score(), self.state.streak(), self.state.on_fire());

        match self.state.mode {
            Mode::Playing => {
                self.links.send_report(report);
                if let Some(next) = self.backlog.pop_front() {
                    self.present(next);
                }
            }
            Mode::Demo => self.links.schedule_demo_step(self.config.demo_step_delay()),
            Mode::Welcome | Mode::Report => {}
        }

        self.state.tally.attempts.last()
    }

    /// Applies a score delta from the action channel.
    pub fn apply_score_delta(&mut self, delta: ScoreDeltaMessage) {
        if self.state.mode != Mode::Playing {
            tracing::debug!("Score delta {} ignored in {}", delta.points, self.state.mode);
            return;
        }

        if let Some(id) = delta.id {
            match self.state.attempts().iter().rev().find(|a| a.event().id() == id) {
                Some(attempt) if attempt.points() != delta.points => tracing::warn!(
                    "Challenge {}: service awarded {} but local judgement was {}",
                    id,
                    delta.points,
                    attempt.points()
                ),
                Some(_) => {}
                None => tracing::warn!("Score delta for unknown challenge {}", id),
            }
        }

        let tally = std::mem::take(&mut self.state.tally);
        self.state.tally = self.engine.credit(tally, delta.points);
        self.presenter
            .score_changed(self.state.score(), self.state.streak(), self.state.on_fire());
    }

    /// One countdown step. Reaching zero ends the session in `Report`.
    pub fn tick(&mut self) {
        if self.state.mode != Mode::Playing {
            return;
        }

        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        self.presenter.countdown(self.state.seconds_remaining);

        if self.state.seconds_remaining == 0 {
            self.teardown();
            if let Some(unresolved) = self.state.current.take() {
                tracing::debug!("Countdown expired with challenge {} unresolved; dropped", unresolved.id());
            }

            self.state.mode = Mode::Report;
            self.announce(Mode::Playing, Mode::Report);

            let report = SessionReport::from_tally(&self.state.tally);
            tracing::info!(
                "Session over: score {} ({}), {}/{} correct",
                report.score,
                report.rank,
                report.correct,
                report.total
            );
            self.presenter.report_ready(&report);
        }
    }

    /// Fires the pending demo step.
    pub fn advance_demo(&mut self) {
        if self.state.mode != Mode::Demo || self.state.current.is_some() {
            return;
        }
        let Some(player) = self.demo.as_mut() else {
            return;
        };

        match player.advance() {
            DemoStep::Next(_) => self.present_demo_item(),
            DemoStep::Completed => {
                tracing::info!("Demo complete after {} items", self.state.attempts().len());
                self.return_to_welcome();
            }
            DemoStep::Exhausted => {}
        }
    }

    /// Abandons the session and returns to `Welcome`. No-op in `Welcome`.
    pub fn cancel(&mut self) {
        if self.state.mode == Mode::Welcome {
            return;
        }
        self.return_to_welcome();
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn check(&self, to: Mode) -> SessionResult<()> {
        if self.state.mode.can_enter(to) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state.mode,
                to,
            })
        }
    }

    fn reset(&mut self, mode: Mode, seconds: u32, engine: ScoringEngine) {
        self.state = SessionState::fresh(mode, seconds);
        self.engine = engine;
        self.backlog.clear();
        self.resolved.clear();
        self.demo = None;
    }

    /// Closes whatever the current mode holds open.
    fn teardown(&mut self) {
        match self.state.mode {
            Mode::Playing => {
                self.links.close_channels();
                self.links.stop_countdown();
            }
            Mode::Demo => self.links.cancel_demo_step(),
            Mode::Welcome | Mode::Report => {}
        }
        self.backlog.clear();
        self.demo = None;
    }

    fn return_to_welcome(&mut self) {
        let from = self.state.mode;
        self.teardown();
        self.reset(Mode::Welcome, 0, ScoringEngine::local());
        self.announce(from, Mode::Welcome);
    }

    fn announce(&mut self, from: Mode, to: Mode) {
        tracing::info!("Session transition: {} -> {}", from, to);
        self.presenter.mode_changed(from, to);
    }

    fn present(&mut self, challenge: JudgedEvent) {
        self.presenter.challenge_presented(&challenge, None);
        self.state.current = Some(challenge);
    }

    fn present_demo_item(&mut self) {
        let Some(item) = self.demo.as_ref().and_then(DemoScriptPlayer::current).cloned() else {
            return;
        };
        self.presenter
            .challenge_presented(&item.event, Some(item.expected));
        self.state.current = Some(item.event);
    }
}
