//! Built-in classification rules.
//!
//! Evaluated in this order, first match wins:
//! 1. `calculator`: "calculate", "compute", or `<n> <op> <n>`
//! 2. `weather`: "weather"
//! 3. `text-transform`: uppercase, lowercase, reverse, capitalize, "word count"
//! 4. `system-info`: "system", "server info", "server status"
//! 5. `help`: "help", "what can you do"

use regex::Regex;

use crate::intent::Intent;

/// A syntactic test over lowercased message text.
#[derive(Clone, Debug)]
pub enum Predicate {
    /// Any keyword occurs as a substring.
    Keywords(&'static [&'static str]),
    Pattern(Regex),
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::Keywords(words) => words.iter().any(|w| lowered.contains(w)),
            Self::Pattern(re) => re.is_match(lowered),
            Self::AnyOf(preds) => preds.iter().any(|p| p.matches(lowered)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IntentRule {
    pub intent: Intent,
    pub predicate: Predicate,
}

impl IntentRule {
    pub fn new(intent: Intent, predicate: Predicate) -> Self {
        Self { intent, predicate }
    }
}

/// Keywords that select a text transformation, in precedence order.
pub const TEXT_TRANSFORM_KEYWORDS: &[&str] =
    &["uppercase", "lowercase", "reverse", "capitalize", "word count"];

/// Build the default ordered rule list.
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new(
            Intent::Calculator,
            Predicate::AnyOf(vec![
                Predicate::Keywords(&["calculate", "compute"]),
                Predicate::Pattern(Regex::new(r"\d+\s*[+\-*/x]\s*\d+").unwrap()),
            ]),
        ),
        IntentRule::new(Intent::Weather, Predicate::Keywords(&["weather"])),
        IntentRule::new(Intent::TextTransform, Predicate::Keywords(TEXT_TRANSFORM_KEYWORDS)),
        IntentRule::new(
            Intent::SystemInfo,
            Predicate::Keywords(&["system", "server info", "server status"]),
        ),
        IntentRule::new(Intent::Help, Predicate::Keywords(&["help", "what can you do"])),
    ]
}
