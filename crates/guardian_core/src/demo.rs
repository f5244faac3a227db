//! # Demo Script
//!
//! A fixed, ordered set of pre-labeled challenges for training mode. Fully
//! deterministic: no randomness, no network.
//!
//! The built-in script ships six items. A different script can be injected
//! (for example loaded from a TOML file by the binary) through
//! [`DemoScript::from_entries`].

use guardian_shared::{ChallengeEvent, ChallengeId, JudgedEvent, Label, Verdict};
use serde::Deserialize;

use crate::error::{SessionError, SessionResult};
use crate::explainer::HeuristicExplainer;

/// One row of a demo script file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DemoEntry {
    /// Challenge id.
    pub id: ChallengeId,
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Source IP.
    pub ip: String,
    /// User agent.
    pub user_agent: String,
    /// Request rate.
    pub freq: f64,
    /// Sector.
    #[serde(default)]
    pub sector: String,
    /// Ground truth.
    pub anomaly: bool,
    /// Anomaly confidence.
    #[serde(default)]
    pub score: f64,
    /// Canned rationale.
    pub hint: String,
    /// The verdict the trainee is expected to give.
    pub expected: Verdict,
}

/// A demo script file: `[[items]]` tables.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DemoScriptFile {
    /// Rows in presentation order.
    pub items: Vec<DemoEntry>,
}

/// One scripted challenge.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoItem {
    /// The challenge with its canned rationale.
    pub event: JudgedEvent,
    /// The verdict the trainee is expected to give.
    pub expected: Verdict,
}

/// A demo item whose canned rationale differs from what the rule table
/// derives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptMismatch {
    /// Offending item.
    pub id: ChallengeId,
    /// Rationale shipped with the item.
    pub canned: String,
    /// Rationale the explainer derives.
    pub derived: String,
}

/// Ordered demo data.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoScript {
    items: Vec<DemoItem>,
}

impl DemoScript {
    /// Builds a script from file rows.
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyScript`] with no rows,
    /// [`SessionError::ScriptContradiction`] if a row expects the wrong verdict
    /// for its own label.
    pub fn from_entries(entries: Vec<DemoEntry>) -> SessionResult<Self> {
        if entries.is_empty() {
            return Err(SessionError::EmptyScript);
        }

        let items = entries
            .into_iter()
            .map(|entry| {
                if Verdict::for_anomaly(entry.anomaly) != entry.expected {
                    return Err(SessionError::ScriptContradiction {
                        id: entry.id,
                        expected: entry.expected,
                    });
                }
                Ok(DemoItem {
                    event: JudgedEvent::new(
                        ChallengeEvent {
                            id: entry.id,
                            method: entry.method,
                            path: entry.path,
                            source_ip: entry.ip,
                            user_agent: entry.user_agent,
                            frequency: entry.freq,
                            sector: entry.sector,
                        },
                        Label {
                            is_anomaly: entry.anomaly,
                            confidence: entry.score,
                        },
                        entry.hint,
                    ),
                    expected: entry.expected,
                })
            })
            .collect::<SessionResult<Vec<_>>>()?;

        Ok(Self { items })
    }

    /// The built-in six-item training script.
    #[must_use]
    pub fn builtin() -> Self {
        #[allow(clippy::type_complexity)]
        const ROWS: [(ChallengeId, &str, &str, &str, &str, f64, &str, bool, f64, &str); 6] = [
            (1, "GET", "/v1/accounts/12345/balance", "192.168.1.100", "Mozilla/5.0...", 1.0,
             "Financial Services", false, 0.12, "Normal balance check. Safe."),
            (2, "POST", "/v1/users/999999/inject", "185.23.45.67", "BotNet/2.1", 18.0,
             "attack", true, 1.92, "Fake user ID + bot = SQL Injection attempt!"),
            (3, "POST", "/api/v2/cart/add", "203.0.113.45", "Python-urllib/3.9", 25.0,
             "E-commerce & Retail", true, 1.45, "DDoS in progress: 25 req/sec!"),
            (4, "GET", "/tracking/ABC123456789", "8.8.8.8", "curl/7.68.0", 3.0,
             "Transportation & Logistics", false, 0.08, "Legit tracking query. Safe."),
            (5, "POST", "/v1/auth/login", "185.23.45.67", "BotNet/2.1", 30.0,
             "Financial Services", true, 2.10, "Brute force login detected!"),
            (6, "GET", "/api/v2/products/98765", "192.168.1.100", "Mozilla/5.0...", 2.0,
             "E-commerce & Retail", false, 0.15, "User browsing product. Normal."),
        ];

        let items = ROWS
            .iter()
            .map(|&(id, method, path, ip, agent, freq, sector, anomaly, score, hint)| DemoItem {
                event: JudgedEvent::new(
                    ChallengeEvent {
                        id,
                        method: method.into(),
                        path: path.into(),
                        source_ip: ip.into(),
                        user_agent: agent.into(),
                        frequency: freq,
                        sector: sector.into(),
                    },
                    Label {
                        is_anomaly: anomaly,
                        confidence: score,
                    },
                    hint,
                ),
                expected: Verdict::for_anomaly(anomaly),
            })
            .collect();

        Self { items }
    }

    /// Items in order.
    #[must_use]
    pub fn items(&self) -> &[DemoItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the script has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compares every canned rationale with the rule table.
    #[must_use]
    pub fn validate(&self, explainer: &HeuristicExplainer) -> Vec<ScriptMismatch> {
        self.items
            .iter()
            .filter_map(|item| {
                let derived = explainer.rationale(&item.event.event);
                (derived != item.event.rationale).then(|| ScriptMismatch {
                    id: item.event.id(),
                    canned: item.event.rationale.clone(),
                    derived,
                })
            })
            .collect()
    }
}

impl Default for DemoScript {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Outcome of [`DemoScriptPlayer::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoStep {
    /// Moved to the item at this index.
    Next(usize),
    /// Ran off the end. Reported exactly once.
    Completed,
    /// Already completed; nothing happened.
    Exhausted,
}

/// Linear cursor over a [`DemoScript`].
#[derive(Clone, Debug)]
pub struct DemoScriptPlayer {
    script: DemoScript,
    index: usize,
    finished: bool,
}

impl DemoScriptPlayer {
    /// Starts at item 0.
    #[must_use]
    pub fn new(script: DemoScript) -> Self {
        let finished = script.is_empty();
        Self {
            script,
            index: 0,
            finished,
        }
    }

    /// Index of the current item.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.index
    }

    /// The current item, `None` once completed.
    #[must_use]
    pub fn current(&self) -> Option<&DemoItem> {
        if self.finished {
            None
        } else {
            self.script.items.get(self.index)
        }
    }

    /// True once the script has run out.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Moves to the next item. No wraparound.
    pub fn advance(&mut self) -> DemoStep {
        if self.finished {
            return DemoStep::Exhausted;
        }
        if self.index + 1 < self.script.len() {
            self.index += 1;
            DemoStep::Next(self.index)
        } else {
            self.finished = true;
            DemoStep::Completed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_script_shape() {
        let script = DemoScript::builtin();
        assert_eq!(script.len(), 6);

        let ids: Vec<_> = script.items().iter().map(|i| i.event.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

        for item in script.items() {
            assert_eq!(item.expected, item.event.correct_verdict());
        }
    }

    #[test]
    fn test_builtin_script_agrees_with_rules() {
        let mismatches = DemoScript::builtin().validate(&HeuristicExplainer::new());
        assert!(mismatches.is_empty(), "{mismatches:?}");
    }

    #[test]
    fn test_player_walks_six_items_then_completes_once() {
        let mut player = DemoScriptPlayer::new(DemoScript::builtin());
        assert_eq!(player.current_index(), 0);
        assert_eq!(player.current().map(|i| i.event.id()), Some(1));

        for expected in 1..6 {
            assert_eq!(player.advance(), DemoStep::Next(expected));
        }
        assert_eq!(player.current().map(|i| i.event.id()), Some(6));

        assert_eq!(player.advance(), DemoStep::Completed);
        assert!(player.is_finished());
        assert!(player.current().is_none());

        assert_eq!(player.advance(), DemoStep::Exhausted);
        assert_eq!(player.advance(), DemoStep::Exhausted);
    }

    #[test]
    fn test_script_from_toml() {
        let raw = r#"
            [[items]]
            id = 10
            method = "GET"
            path = "/api/v1/stream/start"
            ip = "8.8.8.8"
            user_agent = "Mozilla/5.0"
            freq = 4.0
            sector = "Entertainment & Media"
            anomaly = false
            score = 0.1
            hint = "Video streaming request. Safe."
            expected = "pass"
        "#;
        let file: DemoScriptFile = toml::from_str(raw).unwrap();
        let script = DemoScript::from_entries(file.items).unwrap();

        assert_eq!(script.len(), 1);
        assert_eq!(script.items()[0].expected, Verdict::Pass);
        assert!(script.validate(&HeuristicExplainer::new()).is_empty());
    }

    #[test]
    fn test_contradicting_entry_rejected() {
        let entry = DemoEntry {
            id: 3,
            method: "GET".into(),
            path: "/".into(),
            ip: "1.1.1.1".into(),
            user_agent: "x".into(),
            freq: 1.0,
            sector: String::new(),
            anomaly: true,
            score: 1.0,
            hint: "x".into(),
            expected: Verdict::Pass,
        };
        assert_eq!(
            DemoScript::from_entries(vec![entry]),
            Err(SessionError::ScriptContradiction { id: 3, expected: Verdict::Pass })
        );
        assert_eq!(DemoScript::from_entries(Vec::new()), Err(SessionError::EmptyScript));
    }

    #[test]
    fn test_mismatch_reported() {
        let mut script = DemoScript::builtin();
        script.items[0].event.rationale = "Looks fine".into();

        let mismatches = script.validate(&HeuristicExplainer::new());
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].id, 1);
        assert_eq!(mismatches[0].derived, "Normal balance check. Safe.");
    }
}
