use std::fmt;

use serde::{Deserialize, Serialize};

/// Category a chat message is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Calculator,
    Weather,
    TextTransform,
    SystemInfo,
    Help,
    /// Nothing matched.
    Fallback,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calculator => "calculator",
            Self::Weather => "weather",
            Self::TextTransform => "text-transform",
            Self::SystemInfo => "system-info",
            Self::Help => "help",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
