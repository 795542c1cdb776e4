//! Response classification as an ordered, first-match-wins rule table.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Ban signals seen in upstream payloads.
static BAN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(change_number_new_number_banned|account suspended|account banned|forbidden|bann(?:ed|ing)|blocked|bad-token|invalid[-_ ]token|auth_failed|auth_failure)",
    )
    .expect("Invalid ban pattern")
});

/// Explicit success markers.
static OK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)("status"\s*:\s*"ok"|"code"\s*:\s*"0"|code.*ok|status.*ok)"#)
        .expect("Invalid ok pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Banned,
    NotBanned,
}

impl Verdict {
    pub fn is_banned(&self) -> bool {
        matches!(self, Verdict::Banned)
    }
}

/// A named predicate over `(status, body)`.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(u16, &str) -> bool,
    pub verdict: Verdict,
}

/// Verdict plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub rule: &'static str,
}

/// Rule name reported when nothing matched.
pub const NO_SIGNAL: &str = "no_signal";

fn ban_pattern(_status: u16, body: &str) -> bool {
    BAN_PATTERN.is_match(body)
}

fn auth_status(status: u16, _body: &str) -> bool {
    status == 401 || status == 403
}

fn ok_pattern(_status: u16, body: &str) -> bool {
    OK_PATTERN.is_match(body)
}

fn success_status(status: u16, _body: &str) -> bool {
    (200..300).contains(&status)
}

/// Default rules. Body ban signals take precedence over any status code.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule {
        name: "ban_pattern",
        matches: ban_pattern,
        verdict: Verdict::Banned,
    },
    Rule {
        name: "auth_status",
        matches: auth_status,
        verdict: Verdict::Banned,
    },
    Rule {
        name: "ok_pattern",
        matches: ok_pattern,
        verdict: Verdict::NotBanned,
    },
    Rule {
        name: "success_status",
        matches: success_status,
        verdict: Verdict::NotBanned,
    },
];

#[derive(Clone)]
pub struct ResponseClassifier {
    rules: Vec<Rule>,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl ResponseClassifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Evaluate rules in order. Unmatched responses are `NotBanned`.
    pub fn classify(&self, status: u16, body: &str) -> Classification {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(status, body))
            .map(|rule| Classification {
                verdict: rule.verdict,
                rule: rule.name,
            })
            .unwrap_or(Classification {
                verdict: Verdict::NotBanned,
                rule: NO_SIGNAL,
            })
    }
}
