//! Session modes and the per-session state record.

use guardian_shared::constants::HOT_STREAK_ABOVE;
use guardian_shared::JudgedEvent;

use crate::scoring::{Attempt, Tally};

/// Top-level mode of the trainer.
///
/// ```text
///            ┌──────────> Demo ──────────┐ (complete / cancel)
///  Welcome ──┤                           ├──> Welcome
///            └──> Playing ──> Report ────┘
///                    └───────────────────> Welcome (cancel)
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Idle. Initial mode and the return target of every path.
    #[default]
    Welcome,
    /// Scripted training.
    Demo,
    /// Live, timed play.
    Playing,
    /// End-of-session summary.
    Report,
}

impl Mode {
    /// Returns true if `to` is an edge of the state machine from `self`.
    #[must_use]
    pub const fn can_enter(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Welcome, Self::Playing | Self::Demo)
                | (Self::Playing, Self::Report | Self::Welcome)
                | (Self::Demo | Self::Report, Self::Welcome)
        )
    }

    /// Upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Welcome => "WELCOME",
            Self::Demo => "DEMO",
            Self::Playing => "PLAYING",
            Self::Report => "REPORT",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to a challenge offered by the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intake {
    /// Shown to the player.
    Presented,
    /// Held back behind the unresolved current challenge.
    Queued,
    /// Same id already resolved, outstanding or queued this session.
    Duplicate,
    /// Not playing; thrown away.
    Ignored,
}

/// State of the current session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub(crate) mode: Mode,
    pub(crate) current: Option<JudgedEvent>,
    pub(crate) tally: Tally,
    pub(crate) seconds_remaining: u32,
}

impl SessionState {
    /// A fresh session in `mode`.
    #[must_use]
    pub(crate) fn fresh(mode: Mode, seconds_remaining: u32) -> Self {
        Self {
            mode,
            current: None,
            tally: Tally::default(),
            seconds_remaining,
        }
    }

    /// Current mode.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The unresolved challenge, if any.
    #[inline]
    #[must_use]
    pub const fn current_challenge(&self) -> Option<&JudgedEvent> {
        self.current.as_ref()
    }

    /// Running score.
    #[inline]
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.tally.score
    }

    /// Current streak.
    #[inline]
    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.tally.streak
    }

    /// Countdown value.
    #[inline]
    #[must_use]
    pub const fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// Resolved challenges, in order.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.tally.attempts
    }

    /// Score, streak and history.
    #[inline]
    #[must_use]
    pub const fn tally(&self) -> &Tally {
        &self.tally
    }

    /// True while the streak is hot.
    #[inline]
    #[must_use]
    pub const fn on_fire(&self) -> bool {
        self.tally.streak > HOT_STREAK_ABOVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_edges() {
        use Mode::{Demo, Playing, Report, Welcome};

        let allowed = [
            (Welcome, Playing),
            (Welcome, Demo),
            (Playing, Report),
            (Playing, Welcome),
            (Demo, Welcome),
            (Report, Welcome),
        ];
        for from in [Welcome, Demo, Playing, Report] {
            for to in [Welcome, Demo, Playing, Report] {
                assert_eq!(from.can_enter(to), allowed.contains(&(from, to)), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_on_fire_threshold() {
        let mut state = SessionState::fresh(Mode::Demo, 0);
        state.tally.streak = 2;
        assert!(!state.on_fire());
        state.tally.streak = 3;
        assert!(state.on_fire());
    }
}
