//! Challenge and verdict types.
//!
//! A [`ChallengeEvent`] is one simulated API request. Once the labeling
//! service (or the demo script) attaches a [`Label`] and a rationale it
//! becomes a [`JudgedEvent`], which is what the player sees.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a challenge by its producer.
pub type ChallengeId = u64;

/// One simulated API request. Immutable once received.
///
/// Not a wire type: feed messages and demo entries are mapped onto it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeEvent {
    /// Producer-assigned identifier.
    pub id: ChallengeId,
    /// HTTP method (`GET`, `POST`, ...).
    pub method: String,
    /// Request path.
    pub path: String,
    /// Source IP address.
    pub source_ip: String,
    /// User-Agent header.
    pub user_agent: String,
    /// Observed request rate for this client.
    pub frequency: f64,
    /// Industry sector the request was generated for.
    pub sector: String,
}

impl ChallengeEvent {
    /// Returns true if the method mutates server state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }

    /// Returns true if the method is a plain read.
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.method == "GET"
    }
}

/// Ground truth attached to a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// True if the request is an attack.
    pub is_anomaly: bool,
    /// Continuous anomaly confidence.
    pub confidence: f64,
}

/// A challenge paired with its ground truth and rationale.
#[derive(Clone, Debug, PartialEq)]
pub struct JudgedEvent {
    /// The request itself.
    pub event: ChallengeEvent,
    /// Ground truth.
    pub label: Label,
    /// Human-readable explanation of the label.
    pub rationale: String,
}

impl JudgedEvent {
    /// Creates a judged event.
    #[must_use]
    pub fn new(event: ChallengeEvent, label: Label, rationale: impl Into<String>) -> Self {
        Self {
            event,
            label,
            rationale: rationale.into(),
        }
    }

    /// Returns the challenge id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChallengeId {
        self.event.id
    }

    /// Returns the verdict that would be judged correct.
    #[must_use]
    pub const fn correct_verdict(&self) -> Verdict {
        Verdict::for_anomaly(self.label.is_anomaly)
    }
}

/// The player's classification of a challenge.
///
/// On the wire a block is reported as `"attack"` and a pass as `"false"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The request is an attack and must be blocked.
    #[serde(rename = "attack", alias = "block")]
    Block,
    /// The request is benign and may pass.
    #[serde(rename = "false", alias = "pass")]
    Pass,
}

impl Verdict {
    /// Returns the verdict matching a ground-truth anomaly flag.
    #[must_use]
    pub const fn for_anomaly(is_anomaly: bool) -> Self {
        if is_anomaly {
            Self::Block
        } else {
            Self::Pass
        }
    }

    /// Returns true if this verdict agrees with the ground truth.
    #[must_use]
    pub const fn judges(self, label: &Label) -> bool {
        matches!(self, Self::Block) == label.is_anomaly
    }

    /// Returns the wire token for this verdict.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Block => "attack",
            Self::Pass => "false",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block => f.write_str("BLOCK"),
            Self::Pass => f.write_str("PASS"),
        }
    }
}
