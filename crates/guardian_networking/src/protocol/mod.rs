//! # Wire Codec
//!
//! JSON text frames on both channels.
//!
//! ```text
//! feed   (server -> client)  FeedMessage        -> JudgedEvent
//! action (client -> server)  ActionReport       -> text
//! action (server -> client)  ScoreDeltaMessage  <- text
//! ```
//!
//! A feed message without a usable hint is explained locally.

use guardian_core::HeuristicExplainer;
use guardian_shared::{ActionReport, FeedMessage, JudgedEvent, ScoreDeltaMessage};

use crate::error::ChannelResult;

/// Decodes one feed message.
///
/// # Errors
///
/// [`ChannelError::Malformed`](crate::ChannelError::Malformed) if the text is
/// not a feed message.
pub fn decode_feed(text: &str, explainer: &HeuristicExplainer) -> ChannelResult<JudgedEvent> {
    let message: FeedMessage = serde_json::from_str(text)?;
    let (event, label, hint) = message.into_parts();
    let rationale = match hint {
        Some(hint) => hint,
        None => explainer.rationale(&event),
    };
    Ok(JudgedEvent::new(event, label, rationale))
}

/// Encodes a verdict report.
///
/// # Errors
///
/// Only if serialization itself fails.
pub fn encode_report(report: &ActionReport) -> ChannelResult<String> {
    Ok(serde_json::to_string(report)?)
}

/// Decodes a score delta.
///
/// # Errors
///
/// [`ChannelError::Malformed`](crate::ChannelError::Malformed) if the text is
/// not a score delta.
pub fn decode_delta(text: &str) -> ChannelResult<ScoreDeltaMessage> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use guardian_shared::Verdict;

    #[test]
    fn test_missing_hint_is_explained_locally() {
        let text = r#"{"id":2,"method":"POST","path":"/v1/users/999999/inject",
            "ip":"185.23.45.67","user_agent":"BotNet/2.1","freq":18,
            "sector":"attack","anomaly":true,"score":1.92}"#;
        let judged = decode_feed(text, &HeuristicExplainer::new()).unwrap();

        assert_eq!(judged.id(), 2);
        assert_eq!(judged.rationale, "Fake user ID + bot = SQL Injection attempt!");
    }

    #[test]
    fn test_service_hint_wins() {
        let text = r#"{"id":7,"log":{"method":"GET","path":"/v1/accounts/1/balance",
            "ip":"10.0.0.1","user_agent":"Mozilla/5.0","freq":1},
            "anomaly":false,"score":0.1,"threat":"Normal Traffic Pattern"}"#;
        let judged = decode_feed(text, &HeuristicExplainer::new()).unwrap();

        assert_eq!(judged.rationale, "Normal Traffic Pattern");
        assert!(!judged.label.is_anomaly);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let explainer = HeuristicExplainer::new();
        for text in ["", "not json", r#"{"id":1}"#, r#"{"points":100}"#] {
            assert!(matches!(decode_feed(text, &explainer), Err(ChannelError::Malformed(_))), "{text}");
        }
        assert!(matches!(decode_delta(r#"{"score":1}"#), Err(ChannelError::Malformed(_))));
    }

    #[test]
    fn test_report_and_delta() {
        let text = encode_report(&ActionReport { id: 5, action: Verdict::Pass, real_anomaly: true }).unwrap();
        assert!(text.contains(r#""action":"false""#));

        assert_eq!(decode_delta(r#"{"points":-50}"#).unwrap(), ScoreDeltaMessage { points: -50, id: None });
        assert_eq!(
            decode_delta(r#"{"points":100,"id":5}"#).unwrap(),
            ScoreDeltaMessage { points: 100, id: Some(5) }
        );
    }
}
