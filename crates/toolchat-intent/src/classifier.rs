use crate::intent::Intent;
use crate::rules::{IntentRule, default_rules};

/// First-match-wins classifier over an ordered rule list.
#[derive(Clone, Debug)]
pub struct Classifier {
    rules: Vec<IntentRule>,
}

impl Classifier {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(&lowered))
            .map_or(Intent::Fallback, |rule| rule.intent)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
