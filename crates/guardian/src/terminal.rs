//! # Terminal Front End
//!
//! A line-oriented [`Presenter`] and the command parser for stdin.

use std::io::Write;

use guardian_core::{Attempt, Mode, Presenter, SessionReport};
use guardian_networking::UserCommand;
use guardian_shared::{JudgedEvent, Verdict};

/// Final seconds printed on every tick; otherwise only every tenth second.
const FINAL_SECONDS: u32 = 5;

/// Help shown in `Welcome`.
pub const WELCOME_HELP: &str = "commands: live | demo | quit";

/// Help shown while a challenge is up.
pub const VERDICT_HELP: &str = "commands: b(lock) | p(ass) | c(ancel)";

/// Parses one stdin line.
#[must_use]
pub fn parse_command(line: &str) -> Option<UserCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "b" | "block" => Some(UserCommand::Verdict(Verdict::Block)),
        "p" | "pass" => Some(UserCommand::Verdict(Verdict::Pass)),
        "l" | "live" => Some(UserCommand::StartLive),
        "d" | "demo" => Some(UserCommand::StartDemo),
        "c" | "cancel" | "back" => Some(UserCommand::Cancel),
        "q" | "quit" | "exit" => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Prints the session to a writer.
pub struct TerminalPresenter<W: Write> {
    out: W,
}

impl TerminalPresenter<std::io::Stdout> {
    /// Presenter on stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    /// Presenter on `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// The writer.
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.out
    }

    fn line(&mut self, text: &str) {
        // Write errors are ignored.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn mode_changed(&mut self, _from: Mode, to: Mode) {
        match to {
            Mode::Welcome => {
                self.line("=== API GUARDIAN ===");
                self.line(WELCOME_HELP);
            }
            Mode::Demo => self.line("=== TRAINING MODE ==="),
            Mode::Playing => self.line("=== LIVE: protect the API ==="),
            Mode::Report => self.line("=== TIME UP ==="),
        }
    }

    fn challenge_presented(&mut self, challenge: &JudgedEvent, expected: Option<Verdict>) {
        let event = &challenge.event;
        self.line("");
        self.line(&format!("#{} {} {}", event.id, event.method, event.path));
        self.line(&format!(
            "    from {}  agent {}  {} req/s",
            event.source_ip, event.user_agent, event.frequency
        ));
        if !event.sector.is_empty() {
            self.line(&format!("    sector {}", event.sector));
        }
        self.line(&format!("    intel: {}", challenge.rationale));
        if let Some(expected) = expected {
            self.line(&format!("    hint: {expected} it"));
        }
        self.line(VERDICT_HELP);
    }

    fn verdict_judged(&mut self, attempt: &Attempt) {
        let text = if attempt.correct() {
            format!("CORRECT {:+}", attempt.points())
        } else {
            format!(
                "WRONG {:+} (it was {})",
                attempt.points(),
                attempt.event().correct_verdict()
            )
        };
        self.line(&text);
    }

    fn score_changed(&mut self, score: i64, streak: u32, on_fire: bool) {
        let fire = if on_fire { "  ON FIRE" } else { "" };
        self.line(&format!("score {score}  streak {streak}{fire}"));
    }

    fn countdown(&mut self, seconds_remaining: u32) {
        if seconds_remaining % 10 == 0 || seconds_remaining <= FINAL_SECONDS {
            self.line(&format!("[{seconds_remaining}s]"));
        }
    }

    fn report_ready(&mut self, report: &SessionReport) {
        self.line(&format!("rank      {}", report.rank));
        self.line(&format!("score     {}", report.score));
        self.line(&format!(
            "accuracy  {}% ({}/{})",
            report.accuracy_percent, report.correct, report.total
        ));
        self.line(&format!("streak    {} best", report.best_streak));
        self.line("commands: back | quit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::{Rank, SessionReport};
    use guardian_shared::{ChallengeEvent, Label};

    fn output(presenter: &TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.writer().clone()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("b"), Some(UserCommand::Verdict(Verdict::Block)));
        assert_eq!(parse_command("  PASS \n"), Some(UserCommand::Verdict(Verdict::Pass)));
        assert_eq!(parse_command("live"), Some(UserCommand::StartLive));
        assert_eq!(parse_command("demo"), Some(UserCommand::StartDemo));
        assert_eq!(parse_command("back"), Some(UserCommand::Cancel));
        assert_eq!(parse_command("q"), Some(UserCommand::Quit));
        assert_eq!(parse_command("nuke it"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_demo_challenge_shows_hint() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        let challenge = JudgedEvent::new(
            ChallengeEvent {
                id: 2,
                method: "POST".into(),
                path: "/v1/users/999999/inject".into(),
                source_ip: "185.23.45.67".into(),
                user_agent: "BotNet/2.1".into(),
                frequency: 18.0,
                sector: String::new(),
            },
            Label { is_anomaly: true, confidence: 1.92 },
            "Fake user ID + bot = SQL Injection attempt!",
        );
        presenter.challenge_presented(&challenge, Some(Verdict::Block));

        let text = output(&presenter);
        assert!(text.contains("#2 POST /v1/users/999999/inject"));
        assert!(text.contains("intel: Fake user ID + bot = SQL Injection attempt!"));
        assert!(text.contains("hint: BLOCK it"));
        assert!(!text.contains("sector"));
    }

    #[test]
    fn test_countdown_is_sparse() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        for seconds in (0..=60).rev() {
            presenter.countdown(seconds);
        }
        let printed = output(&presenter).lines().count();
        // 60, 50, 40, 30, 20, 10 and 5..=0.
        assert_eq!(printed, 12);
    }

    #[test]
    fn test_report_card() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.score_changed(400, 3, true);
        presenter.report_ready(&SessionReport {
            score: 400,
            rank: Rank::Hunter,
            total: 5,
            correct: 4,
            accuracy_percent: 80,
            best_streak: 3,
        });

        let text = output(&presenter);
        assert!(text.contains("ON FIRE"));
        assert!(text.contains("rank      HUNTER"));
        assert!(text.contains("accuracy  80% (4/5)"));
    }
}
