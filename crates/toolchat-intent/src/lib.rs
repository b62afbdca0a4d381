//! # toolchat-intent
//!
//! Routes free-text chat messages to tools.
//!
//! Classification is a purely syntactic filter: an ordered list of
//! (intent, predicate) rules is evaluated first-match-wins over the
//! lowercased text. There is no language understanding, so false positives
//! and negatives are expected behavior. Rule order is the only precedence
//! contract; overlapping keywords resolve to the earlier rule.

#![deny(unsafe_code)]

pub mod classifier;
pub mod dispatcher;
pub mod extract;
pub mod intent;
pub mod rules;

pub use classifier::Classifier;
pub use dispatcher::{DispatchOutcome, Dispatcher, Plan};
pub use intent::Intent;
pub use rules::{IntentRule, Predicate, default_rules};
