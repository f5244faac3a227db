//! # Session Driver
//!
//! The async loop around a [`SessionController`]. It waits on user commands
//! and on [`LiveLinks`] events, hands each one to the controller, then lets
//! the links perform the I/O the controller asked for.
//!
//! ```text
//! loop {
//!     select! {
//!         command  = user commands   -> controller.start_* / submit / cancel
//!         event    = links.next_event() -> controller.tick / receive / apply / advance
//!     }
//!     links.settle()   // connect, close, flush reports
//! }
//! ```
//!
//! One event is handled at a time, to completion, so the controller is the
//! single mutation point.

use guardian_core::{Presenter, SessionController, SessionResult};
use guardian_shared::Verdict;
use tokio::sync::mpsc;

use crate::transport::{LinkEvent, LiveLinks};

/// Something the player asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserCommand {
    /// Start a live session.
    StartLive,
    /// Start the scripted demo.
    StartDemo,
    /// Judge the current challenge.
    Verdict(Verdict),
    /// Abandon the session, or leave the report.
    Cancel,
    /// Stop the driver.
    Quit,
}

enum Step {
    Command(Option<UserCommand>),
    Link(LinkEvent),
}

/// Runs a [`SessionController`] over live links.
pub struct SessionDriver<P: Presenter> {
    controller: SessionController<P, LiveLinks>,
}

impl<P: Presenter> SessionDriver<P> {
    /// Wraps a controller.
    #[must_use]
    pub const fn new(controller: SessionController<P, LiveLinks>) -> Self {
        Self { controller }
    }

    /// The controller.
    #[must_use]
    pub const fn controller(&self) -> &SessionController<P, LiveLinks> {
        &self.controller
    }

    /// Unwraps the controller.
    #[must_use]
    pub fn into_controller(self) -> SessionController<P, LiveLinks> {
        self.controller
    }

    /// Runs until `Quit` or until every command sender is gone. Whatever
    /// session is running is cancelled on the way out.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<UserCommand>) {
        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                event = self.controller.links_mut().next_event() => Step::Link(event),
            };

            match step {
                Step::Command(None | Some(UserCommand::Quit)) => break,
                Step::Command(Some(command)) => {
                    if let Err(e) = self.handle_command(command) {
                        tracing::warn!("{} ignored: {}", describe(command), e);
                    }
                }
                Step::Link(event) => self.handle_event(event),
            }

            self.controller.links_mut().settle().await;
        }

        self.controller.cancel();
        self.controller.links_mut().settle().await;
        tracing::info!("Session driver stopped");
    }

    /// Applies one user command.
    ///
    /// # Errors
    ///
    /// Whatever the controller rejects, e.g. starting a session mid-session.
    pub fn handle_command(&mut self, command: UserCommand) -> SessionResult<()> {
        match command {
            UserCommand::StartLive => self.controller.start_live()?,
            UserCommand::StartDemo => self.controller.start_demo()?,
            UserCommand::Verdict(verdict) => {
                self.controller.submit_verdict(verdict);
            }
            UserCommand::Cancel => self.controller.cancel(),
            UserCommand::Quit => {}
        }
        Ok(())
    }

    /// Applies one link event.
    pub fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Tick => self.controller.tick(),
            LinkEvent::Challenge(challenge) => {
                let id = challenge.id();
                let intake = self.controller.receive_challenge(challenge);
                tracing::debug!("Challenge {}: {:?}", id, intake);
            }
            LinkEvent::ScoreDelta(delta) => self.controller.apply_score_delta(delta),
            LinkEvent::DemoStep => self.controller.advance_demo(),
        }
    }
}

const fn describe(command: UserCommand) -> &'static str {
    match command {
        UserCommand::StartLive => "start live",
        UserCommand::StartDemo => "start demo",
        UserCommand::Verdict(_) => "verdict",
        UserCommand::Cancel => "cancel",
        UserCommand::Quit => "quit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LinkConfig;
    use guardian_core::{DemoScript, HeuristicExplainer, Mode, RecordingPresenter, SessionConfig};
    use std::time::Duration;

    fn driver() -> SessionDriver<RecordingPresenter> {
        let links = LiveLinks::new(LinkConfig::with_base_url("ws://127.0.0.1:9"), HeuristicExplainer::new());
        let controller = SessionController::new(
            SessionConfig {
                demo_step_delay_ms: 1,
                ..Default::default()
            },
            DemoScript::builtin(),
            RecordingPresenter::default(),
            links,
        )
        .unwrap();
        SessionDriver::new(controller)
    }

    #[tokio::test]
    async fn test_demo_runs_to_welcome() {
        let mut driver = driver();
        let (tx, rx) = mpsc::channel(16);

        let run = async {
            driver.run(rx).await;
            driver
        };
        let feed = async move {
            tx.send(UserCommand::StartDemo).await.unwrap();
            for verdict in [
                Verdict::Pass,
                Verdict::Block,
                Verdict::Block,
                Verdict::Pass,
                Verdict::Block,
                Verdict::Pass,
            ] {
                tx.send(UserCommand::Verdict(verdict)).await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            tx.send(UserCommand::Quit).await.unwrap();
        };

        let (driver, ()) = tokio::join!(run, feed);
        let controller = driver.into_controller();
        assert_eq!(controller.mode(), Mode::Welcome);
        assert_eq!(controller.presenter().transitions_to(Mode::Demo), 1);
        assert_eq!(controller.presenter().transitions_to(Mode::Welcome), 1);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut driver = driver();
        driver.handle_command(UserCommand::StartDemo).unwrap();
        assert!(driver.handle_command(UserCommand::StartLive).is_err());
        assert_eq!(driver.controller().mode(), Mode::Demo);
    }
}
