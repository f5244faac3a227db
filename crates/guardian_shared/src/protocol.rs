//! Wire protocol types for the two live channels.
//!
//! Both channels carry one JSON object per text frame.
//!
//! ```text
//! feed   (server -> client)  { id, method, path, ip, user_agent, freq, sector,
//!                              anomaly, score, hint? }
//! action (client -> server)  { id, action: "attack"|"false", real_anomaly }
//! action (server -> client)  { points, id? }
//! ```
//!
//! Older services nest the request under `log` and call the rationale
//! `threat`; [`FeedMessage`] accepts both shapes.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{ChallengeEvent, ChallengeId, Label, Verdict};

/// Request fields as they appear on the feed channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestFields {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Source IP address.
    pub ip: String,
    /// User-Agent header.
    pub user_agent: String,
    /// Request rate.
    pub freq: f64,
    /// Industry sector.
    #[serde(default)]
    pub sector: String,
}

/// One message received on the feed channel.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeedMessage {
    /// Legacy shape: `{ id, log: { ... }, anomaly, score, threat }`.
    Nested {
        /// Challenge id.
        id: ChallengeId,
        /// The request.
        log: RequestFields,
        /// Ground-truth anomaly flag.
        anomaly: bool,
        /// Anomaly confidence.
        #[serde(default)]
        score: f64,
        /// Service-provided rationale.
        #[serde(default, alias = "threat")]
        hint: Option<String>,
    },
    /// Flat shape: request fields inline.
    Flat {
        /// Challenge id.
        id: ChallengeId,
        /// The request.
        #[serde(flatten)]
        request: RequestFields,
        /// Ground-truth anomaly flag.
        anomaly: bool,
        /// Anomaly confidence.
        #[serde(default)]
        score: f64,
        /// Service-provided rationale.
        #[serde(default, alias = "threat")]
        hint: Option<String>,
    },
}

impl FeedMessage {
    /// Splits the message into the challenge, its label and the optional
    /// service rationale.
    #[must_use]
    pub fn into_parts(self) -> (ChallengeEvent, Label, Option<String>) {
        let (id, request, anomaly, score, hint) = match self {
            Self::Nested { id, log, anomaly, score, hint } => (id, log, anomaly, score, hint),
            Self::Flat { id, request, anomaly, score, hint } => (id, request, anomaly, score, hint),
        };

        let event = ChallengeEvent {
            id,
            method: request.method,
            path: request.path,
            source_ip: request.ip,
            user_agent: request.user_agent,
            frequency: request.freq,
            sector: request.sector,
        };
        let label = Label {
            is_anomaly: anomaly,
            confidence: score,
        };
        // An empty hint is as good as none.
        let hint = hint.filter(|h| !h.trim().is_empty());

        (event, label, hint)
    }
}

/// Verdict report sent on the action channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    /// Challenge the verdict is for.
    pub id: ChallengeId,
    /// The player's verdict.
    pub action: Verdict,
    /// Ground truth as received on the feed.
    pub real_anomaly: bool,
}

/// Score delta received on the action channel.
///
/// The reference service does not echo `id`; when it is present, deltas are
/// matched by id instead of by arrival order. `points` may arrive as any JSON
/// number; fractional values are rounded to the nearest whole point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDeltaMessage {
    /// Points awarded by the service.
    #[serde(deserialize_with = "whole_points")]
    pub points: i64,
    /// Challenge the points are for, if echoed.
    #[serde(default)]
    pub id: Option<ChallengeId>,
}

#[allow(clippy::cast_possible_truncation)]
fn whole_points<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Points {
        Whole(i64),
        Fractional(f64),
    }

    match Points::deserialize(deserializer)? {
        Points::Whole(points) => Ok(points),
        Points::Fractional(points) if points.is_finite() => Ok(points.round() as i64),
        Points::Fractional(points) => Err(D::Error::custom(format!("points out of range: {points}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_feed_message() {
        let raw = r#"{"id":5,"method":"POST","path":"/v1/auth/login","ip":"185.23.45.67",
            "user_agent":"BotNet/2.1","freq":30,"sector":"Financial Services",
            "anomaly":true,"score":2.1}"#;
        let msg: FeedMessage = serde_json::from_str(raw).unwrap();
        let (event, label, hint) = msg.into_parts();

        assert_eq!(event.id, 5);
        assert_eq!(event.source_ip, "185.23.45.67");
        assert!((event.frequency - 30.0).abs() < f64::EPSILON);
        assert!(label.is_anomaly);
        assert!(hint.is_none());
    }

    #[test]
    fn test_flat_feed_message_with_hint() {
        let raw = r#"{"id":9,"method":"GET","path":"/admin/export","ip":"45.33.32.156",
            "user_agent":"curl/7.68","freq":2,"anomaly":true,"score":1.4,
            "hint":"Admin path from a script"}"#;
        let msg: FeedMessage = serde_json::from_str(raw).unwrap();
        assert!(matches!(msg, FeedMessage::Flat { .. }));
        let (event, label, hint) = msg.into_parts();

        assert_eq!(event.id, 9);
        assert_eq!(event.path, "/admin/export");
        assert!(label.is_anomaly);
        assert_eq!(hint.as_deref(), Some("Admin path from a script"));
    }

    #[test]
    fn test_nested_feed_message_with_threat() {
        let raw = r#"{"id":77,"log":{"method":"GET","path":"/api/v3/feed","ip":"192.168.1.100",
            "user_agent":"Mozilla/5.0","freq":4,"sector":"Social Media"},
            "anomaly":false,"score":0.08,"threat":"Normal Traffic Pattern"}"#;
        let msg: FeedMessage = serde_json::from_str(raw).unwrap();
        let (event, label, hint) = msg.into_parts();

        assert_eq!(event.id, 77);
        assert_eq!(event.path, "/api/v3/feed");
        assert!(!label.is_anomaly);
        assert_eq!(hint.as_deref(), Some("Normal Traffic Pattern"));
    }

    #[test]
    fn test_blank_hint_is_dropped() {
        let raw = r#"{"id":1,"method":"GET","path":"/","ip":"1.1.1.1","user_agent":"x",
            "freq":1,"anomaly":false,"score":0.0,"hint":"  "}"#;
        let msg: FeedMessage = serde_json::from_str(raw).unwrap();
        assert!(msg.into_parts().2.is_none());
    }

    #[test]
    fn test_action_report_wire_shape() {
        let report = ActionReport {
            id: 5,
            action: Verdict::Block,
            real_anomaly: true,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["action"], "attack");
        assert_eq!(json["real_anomaly"], true);
    }

    #[test]
    fn test_score_delta_without_id() {
        let delta: ScoreDeltaMessage = serde_json::from_str(r#"{"points":-50}"#).unwrap();
        assert_eq!(delta.points, -50);
        assert!(delta.id.is_none());
    }

    #[test]
    fn test_fractional_points_are_rounded() {
        let delta: ScoreDeltaMessage = serde_json::from_str(r#"{"points":100.0,"id":4}"#).unwrap();
        assert_eq!(delta.points, 100);
        assert_eq!(delta.id, Some(4));

        let delta: ScoreDeltaMessage = serde_json::from_str(r#"{"points":-49.6}"#).unwrap();
        assert_eq!(delta.points, -50);

        assert!(serde_json::from_str::<ScoreDeltaMessage>(r#"{"points":"100"}"#).is_err());
    }
}
