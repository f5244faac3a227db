//! # Heuristic Explainer
//!
//! Re-derives, from the request alone, why a challenge looks the way it is
//! labeled. Used whenever the service does not ship its own rationale.
//!
//! ## Rule Table
//!
//! Rules are evaluated top to bottom and the first match wins. Attack rules
//! come first, benign rules second, the default last. Several rules can
//! match the same request, so the order IS the behavior:
//!
//! ```text
//!  1. injection       path has sentinel id + bot agent
//!  2. admin_access    admin resource, not user-scoped
//!  3. brute_force     login resource, freq > 20
//!  4. flood           mutating verb, freq > 20
//!  5. scripted_client scripted agent, freq > 10
//!  6. debug_access    debug resource from outside
//!  7. balance_check   balance resource, freq <= 2
//!  8. browsing        products, read verb
//!  9. tracking        tracking from known-safe address
//! 10. feed_scroll     feed, freq <= 5
//! 11. streaming       stream, read verb
//! 12. inference       predict, freq <= 3
//! 13. login           login, freq <= 3, mutating verb
//! 14. cart            cart, freq <= 5
//!  -  default         "Suspicious pattern detected!"
//! ```

use std::borrow::Cow;

use guardian_shared::ChallengeEvent;

/// User id that never exists in the simulated services.
pub const SENTINEL_USER_ID: &str = "999999";

/// Substring identifying botnet traffic.
pub const BOT_SIGNATURE: &str = "BotNet";

/// Exact user agent of the scripted client.
pub const SCRIPTED_CLIENT: &str = "Python-urllib/3.9";

/// The one internal address allowed on debug endpoints.
pub const TRUSTED_INTERNAL_IP: &str = "192.168.1.100";

/// Public resolver address whose tracking queries are known to be safe.
pub const SAFE_TRACKING_IP: &str = "8.8.8.8";

/// Rationale returned when no rule matches.
pub const DEFAULT_RATIONALE: &str = "Suspicious pattern detected!";

/// Which way a rule points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indication {
    /// The request should be blocked.
    Attack,
    /// The request may pass.
    Benign,
}

/// How a rule phrases its rationale.
#[derive(Clone, Copy, Debug)]
enum Phrase {
    Fixed(&'static str),
    /// `"{prefix}{frequency}{suffix}"`.
    Rate {
        prefix: &'static str,
        suffix: &'static str,
    },
}

/// One `(predicate, rationale)` entry of the table.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    /// Short stable name, for logs and tests.
    pub name: &'static str,
    /// Direction of the rule.
    pub indication: Indication,
    predicate: fn(&ChallengeEvent) -> bool,
    phrase: Phrase,
}

impl Rule {
    /// Returns true if the rule applies to the event.
    #[inline]
    #[must_use]
    pub fn matches(&self, event: &ChallengeEvent) -> bool {
        (self.predicate)(event)
    }

    /// Renders the rule's rationale for the event.
    #[must_use]
    pub fn rationale(&self, event: &ChallengeEvent) -> Cow<'static, str> {
        match self.phrase {
            Phrase::Fixed(text) => Cow::Borrowed(text),
            Phrase::Rate { prefix, suffix } => {
                Cow::Owned(format!("{prefix}{}{suffix}", event.frequency))
            }
        }
    }
}

const fn attack(name: &'static str, predicate: fn(&ChallengeEvent) -> bool, text: &'static str) -> Rule {
    Rule {
        name,
        indication: Indication::Attack,
        predicate,
        phrase: Phrase::Fixed(text),
    }
}

const fn benign(name: &'static str, predicate: fn(&ChallengeEvent) -> bool, text: &'static str) -> Rule {
    Rule {
        name,
        indication: Indication::Benign,
        predicate,
        phrase: Phrase::Fixed(text),
    }
}

/// The canonical rule table, in evaluation order.
pub static DEFAULT_RULES: [Rule; 14] = [
    attack(
        "injection",
        |e| e.path.contains(SENTINEL_USER_ID) && e.user_agent.contains(BOT_SIGNATURE),
        "Fake user ID + bot = SQL Injection attempt!",
    ),
    attack(
        "admin_access",
        |e| e.path.contains("admin") && !e.path.contains("users"),
        "Unauthorized access to admin panel!",
    ),
    attack(
        "brute_force",
        |e| (e.path.contains("login") || e.path.contains("brute")) && e.frequency > 20.0,
        "Brute force login detected!",
    ),
    Rule {
        name: "flood",
        indication: Indication::Attack,
        predicate: |e| e.frequency > 20.0 && e.is_mutating(),
        phrase: Phrase::Rate {
            prefix: "DDoS in progress: ",
            suffix: " req/sec!",
        },
    },
    attack(
        "scripted_client",
        |e| e.user_agent == SCRIPTED_CLIENT && e.frequency > 10.0,
        "Automated script spamming endpoint!",
    ),
    attack(
        "debug_access",
        |e| e.path.contains("debug") && e.source_ip != TRUSTED_INTERNAL_IP,
        "External access to debug endpoint!",
    ),
    benign(
        "balance_check",
        |e| e.path.contains("balance") && e.frequency <= 2.0,
        "Normal balance check. Safe.",
    ),
    benign(
        "browsing",
        |e| e.path.contains("products") && e.is_read(),
        "User browsing product. Normal.",
    ),
    benign(
        "tracking",
        |e| e.path.contains("tracking") && e.source_ip == SAFE_TRACKING_IP,
        "Legit tracking query. Safe.",
    ),
    benign(
        "feed_scroll",
        |e| e.path.contains("feed") && e.frequency <= 5.0,
        "User scrolling social feed. Normal.",
    ),
    benign(
        "streaming",
        |e| e.path.contains("stream") && e.is_read(),
        "Video streaming request. Safe.",
    ),
    benign(
        "inference",
        |e| e.path.contains("predict") && e.frequency <= 3.0,
        "AI model inference. Normal.",
    ),
    benign(
        "login",
        |e| e.path.contains("login") && e.frequency <= 3.0 && e.is_mutating(),
        "Standard login attempt. Safe.",
    ),
    benign(
        "cart",
        |e| e.path.contains("cart") && e.frequency <= 5.0,
        "User adding to cart. Normal.",
    ),
];

/// Result of explaining one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Explanation {
    /// Name of the rule that fired, `None` for the default.
    pub rule: Option<&'static str>,
    /// Position of the rule in the table, `None` for the default.
    pub position: Option<usize>,
    /// Direction. The default leans towards attack.
    pub indication: Indication,
    /// The rationale text.
    pub text: Cow<'static, str>,
}

/// Ordered, first-match-wins rationale engine.
#[derive(Clone, Debug)]
pub struct HeuristicExplainer {
    rules: Vec<Rule>,
}

impl HeuristicExplainer {
    /// Creates an explainer with the canonical table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    /// Creates an explainer with a custom table.
    #[must_use]
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Returns the table in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Explains an event. Total: always returns exactly one rationale.
    #[must_use]
    pub fn explain(&self, event: &ChallengeEvent) -> Explanation {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(event))
            .map_or_else(
                || Explanation {
                    rule: None,
                    position: None,
                    indication: Indication::Attack,
                    text: Cow::Borrowed(DEFAULT_RATIONALE),
                },
                |(position, rule)| Explanation {
                    rule: Some(rule.name),
                    position: Some(position),
                    indication: rule.indication,
                    text: rule.rationale(event),
                },
            )
    }

    /// Returns only the rationale text.
    #[must_use]
    pub fn rationale(&self, event: &ChallengeEvent) -> String {
        self.explain(event).text.into_owned()
    }
}

impl Default for HeuristicExplainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, path: &str, ip: &str, agent: &str, freq: f64) -> ChallengeEvent {
        ChallengeEvent {
            id: 1,
            method: method.into(),
            path: path.into(),
            source_ip: ip.into(),
            user_agent: agent.into(),
            frequency: freq,
            sector: String::new(),
        }
    }

    #[test]
    fn test_injection_beats_later_rules() {
        let explainer = HeuristicExplainer::new();
        let event = request("POST", "/v1/users/999999/inject", "185.23.45.67", "BotNet/2.1", 18.0);

        let explanation = explainer.explain(&event);
        assert_eq!(explanation.rule, Some("injection"));
        assert_eq!(explanation.text, "Fake user ID + bot = SQL Injection attempt!");
        assert_eq!(explanation.indication, Indication::Attack);
    }

    #[test]
    fn test_balance_check() {
        let explainer = HeuristicExplainer::new();
        let event = request("GET", "/v1/accounts/12345/balance", "192.168.1.100", "Mozilla/5.0", 1.0);

        assert_eq!(explainer.rationale(&event), "Normal balance check. Safe.");
        assert_eq!(explainer.explain(&event).indication, Indication::Benign);
    }

    #[test]
    fn test_flood_includes_frequency() {
        let explainer = HeuristicExplainer::new();
        let event = request("POST", "/api/v2/cart/add", "203.0.113.45", "Python-urllib/3.9", 25.0);

        assert_eq!(explainer.rationale(&event), "DDoS in progress: 25 req/sec!");
    }

    #[test]
    fn test_fast_login_reads_as_brute_force_not_flood() {
        let explainer = HeuristicExplainer::new();
        let login = request("POST", "/v1/auth/login", "185.23.45.67", "BotNet/2.1", 30.0);
        let explanation = explainer.explain(&login);
        assert_eq!(explanation.rule, Some("brute_force"));
        assert_eq!(explanation.text, "Brute force login detected!");

        // Same rate on a path with neither marker falls through to the flood rule.
        let signup = request("POST", "/v1/auth/signup", "185.23.45.67", "BotNet/2.1", 30.0);
        assert_eq!(explainer.rationale(&signup), "DDoS in progress: 30 req/sec!");
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let explainer = HeuristicExplainer::new();
        let event = request("GET", "/api/v1/patients/77/record", "10.0.0.20", "Mozilla/5.0", 40.0);

        let explanation = explainer.explain(&event);
        assert!(explanation.rule.is_none());
        assert_eq!(explanation.text, DEFAULT_RATIONALE);
    }

    /// One row per rule: an event that reaches exactly that rule first.
    #[test]
    fn test_every_rule_in_order() {
        let explainer = HeuristicExplainer::new();
        let table = [
            (request("POST", "/v1/users/999999/inject", "1.2.3.4", "BotNet/2.1", 1.0), "injection"),
            (request("GET", "/admin/debug", "45.79.123.45", "Go-http-client/1.1", 900.0), "admin_access"),
            (request("POST", "/v1/auth/login", "185.23.45.67", "BotNet/2.1", 30.0), "brute_force"),
            (request("POST", "/api/v2/cart/add", "203.0.113.45", "x", 21.0), "flood"),
            (request("GET", "/api/v3/feed", "203.0.113.45", "Python-urllib/3.9", 11.0), "scripted_client"),
            (request("GET", "/debug/config", "45.79.123.45", "curl/7.68.0", 1.0), "debug_access"),
            (request("GET", "/v1/accounts/9/balance", "192.168.1.100", "Mozilla/5.0", 2.0), "balance_check"),
            (request("GET", "/api/v2/products/98765", "192.168.1.100", "Mozilla/5.0", 2.0), "browsing"),
            (request("GET", "/tracking/ABC123", "8.8.8.8", "curl/7.68.0", 3.0), "tracking"),
            (request("GET", "/api/v3/feed", "192.168.1.100", "Mozilla/5.0", 5.0), "feed_scroll"),
            (request("GET", "/api/v1/stream/start", "8.8.8.8", "Mozilla/5.0", 90.0), "streaming"),
            (request("POST", "/api/v1/models/predict", "10.0.0.30", "Mozilla/5.0", 3.0), "inference"),
            (request("POST", "/v1/auth/login", "192.168.1.100", "Mozilla/5.0", 3.0), "login"),
            (request("POST", "/api/v2/cart/add", "203.0.113.45", "Mozilla/5.0", 5.0), "cart"),
        ];

        for (position, (event, name)) in table.iter().enumerate() {
            let explanation = explainer.explain(event);
            assert_eq!(explanation.rule, Some(*name), "row {position}");
            assert_eq!(explanation.position, Some(position), "row {position}");
        }
    }

    #[test]
    fn test_debug_from_trusted_address_is_not_flagged() {
        let explainer = HeuristicExplainer::new();
        let event = request("GET", "/debug/info", TRUSTED_INTERNAL_IP, "curl/7.68.0", 1.0);

        assert_ne!(explainer.explain(&event).rule, Some("debug_access"));
    }

    #[test]
    fn test_custom_table() {
        let explainer = HeuristicExplainer::with_rules(vec![DEFAULT_RULES[13]]);
        let event = request("POST", "/api/v2/cart/add", "x", "x", 1.0);

        assert_eq!(explainer.rules().len(), 1);
        assert_eq!(explainer.explain(&event).position, Some(0));
    }

    #[test]
    fn test_determinism() {
        let explainer = HeuristicExplainer::new();
        let event = request("PUT", "/internal/test", "45.79.123.45", "Python-urllib/3.9", 700.0);

        let first = explainer.explain(&event);
        for _ in 0..100 {
            assert_eq!(explainer.explain(&event), first);
        }
    }
}
