//! # Scoring Engine
//!
//! Score, streak and attempt-log bookkeeping. Every operation takes a
//! [`Tally`] by value and returns the next one; there is no hidden state.
//!
//! ## Award Rule
//!
//! ```text
//! correct    -> +100, streak + 1
//! incorrect  ->  -50, streak = 0
//! ```
//!
//! In live play the running score is owned by the remote service: the local
//! engine keeps streak and history, and the score moves only when a delta
//! arrives on the action channel ([`ScorePolicy::Remote`]).

use guardian_shared::{JudgedEvent, Verdict, POINTS_CORRECT, POINTS_INCORRECT};

/// A resolved challenge. Built only through [`Attempt::judge`], never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    event: JudgedEvent,
    verdict: Verdict,
    correct: bool,
    points: i64,
}

impl Attempt {
    /// Judges a verdict against the event's ground truth.
    #[must_use]
    pub fn judge(event: JudgedEvent, verdict: Verdict) -> Self {
        let correct = verdict.judges(&event.label);
        Self {
            event,
            verdict,
            correct,
            points: if correct { POINTS_CORRECT } else { POINTS_INCORRECT },
        }
    }

    /// The judged event.
    #[must_use]
    pub const fn event(&self) -> &JudgedEvent {
        &self.event
    }

    /// The player's verdict.
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Whether the verdict matched the ground truth.
    #[must_use]
    pub const fn correct(&self) -> bool {
        self.correct
    }

    /// Points awarded locally: always `+100` or `-50`.
    #[must_use]
    pub const fn points(&self) -> i64 {
        self.points
    }
}

/// Accumulated score, streak and history of one session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    /// Running score.
    pub score: i64,
    /// Consecutive correct verdicts since the last mistake.
    pub streak: u32,
    /// Longest streak of the session.
    pub best_streak: u32,
    /// Resolved challenges, in order.
    pub attempts: Vec<Attempt>,
}

impl Tally {
    /// Number of correct attempts.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.correct()).count()
    }
}

/// Who owns the running score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScorePolicy {
    /// Local awards move the score (demo).
    Local,
    /// Only remote deltas move the score (live).
    Remote,
}

/// Pure score/streak transformer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoringEngine {
    policy: ScorePolicy,
}

impl ScoringEngine {
    /// Engine whose score follows local awards.
    #[must_use]
    pub const fn local() -> Self {
        Self {
            policy: ScorePolicy::Local,
        }
    }

    /// Engine whose score follows remote deltas.
    #[must_use]
    pub const fn remote() -> Self {
        Self {
            policy: ScorePolicy::Remote,
        }
    }

    /// Returns the score policy.
    #[must_use]
    pub const fn policy(&self) -> ScorePolicy {
        self.policy
    }

    /// Applies a judged attempt.
    #[must_use]
    pub fn apply(&self, mut tally: Tally, attempt: Attempt) -> Tally {
        if attempt.points() < 0 {
            tally.streak = 0;
        } else {
            tally.streak += 1;
            tally.best_streak = tally.best_streak.max(tally.streak);
        }
        if self.policy == ScorePolicy::Local {
            tally.score += attempt.points();
        }
        tally.attempts.push(attempt);
        tally
    }

    /// Applies a score delta reported by the remote service.
    #[must_use]
    pub fn credit(&self, mut tally: Tally, points: i64) -> Tally {
        if self.policy == ScorePolicy::Remote {
            tally.score += points;
        }
        tally
    }
}

/// Named tier derived from the final score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    /// Below 300.
    Rookie,
    /// 300 and up.
    Hunter,
    /// 800 and up.
    Guardian,
    /// 1200 and up.
    EliteGuardian,
    /// 1500 and up.
    Legend,
}

impl Rank {
    /// Ranks a score.
    #[must_use]
    pub const fn from_score(score: i64) -> Self {
        match score {
            s if s >= 1500 => Self::Legend,
            s if s >= 1200 => Self::EliteGuardian,
            s if s >= 800 => Self::Guardian,
            s if s >= 300 => Self::Hunter,
            _ => Self::Rookie,
        }
    }

    /// Display title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Rookie => "ROOKIE",
            Self::Hunter => "HUNTER",
            Self::Guardian => "GUARDIAN",
            Self::EliteGuardian => "ELITE GUARDIAN",
            Self::Legend => "LEGEND",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// End-of-session summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionReport {
    /// Final score.
    pub score: i64,
    /// Tier for the final score.
    pub rank: Rank,
    /// Resolved challenges.
    pub total: usize,
    /// Correct verdicts.
    pub correct: usize,
    /// `round(correct / total * 100)`, 0 with no attempts.
    pub accuracy_percent: u32,
    /// Longest streak.
    pub best_streak: u32,
}

impl SessionReport {
    /// Summarizes a tally.
    #[must_use]
    pub fn from_tally(tally: &Tally) -> Self {
        let total = tally.attempts.len();
        let correct = tally.correct_count();
        let accuracy_percent = if total == 0 {
            0
        } else {
            u32::try_from((correct * 100 + total / 2) / total).unwrap_or(100)
        };

        Self {
            score: tally.score,
            rank: Rank::from_score(tally.score),
            total,
            correct,
            accuracy_percent,
            best_streak: tally.best_streak,
        }
    }
}
