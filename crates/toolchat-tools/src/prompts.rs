//! Prompt templates exposed through `prompts/list` and `prompts/get`.
//!
//! Each template renders into a single user message that, sent through
//! `chat/message`, routes to the matching tool.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use toolchat_core::tools::{ContentBlock, TextOperation};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: ContentBlock,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("unknown prompt: {0}")]
    UnknownPrompt(String),
    #[error("prompt {prompt} requires argument '{argument}'")]
    MissingArgument { prompt: String, argument: String },
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },
}

struct Template {
    name: &'static str,
    description: &'static str,
    arguments: &'static [(&'static str, &'static str, bool)],
}

static TEMPLATES: [Template; 3] = [
    Template {
        name: "weather_report",
        description: "Ask for the current weather in a city",
        arguments: &[("city", "City to report on", true)],
    },
    Template {
        name: "calculate",
        description: "Evaluate a simple arithmetic expression such as 12 * 4",
        arguments: &[("expression", "Expression of the form <number> <op> <number>", true)],
    },
    Template {
        name: "transform_text",
        description: "Apply a text transformation",
        arguments: &[
            ("operation", "uppercase, lowercase, reverse, capitalize or word_count", true),
            ("text", "Text to transform", true),
        ],
    },
];

pub fn list() -> Vec<PromptDefinition> {
    TEMPLATES
        .iter()
        .map(|t| PromptDefinition {
            name: t.name.to_string(),
            description: t.description.to_string(),
            arguments: t
                .arguments
                .iter()
                .map(|(name, description, required)| PromptArgument {
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    required: *required,
                })
                .collect(),
        })
        .collect()
}

/// Render `name` with `arguments`.
pub fn get(name: &str, arguments: &HashMap<String, String>) -> Result<GetPromptResult, PromptError> {
    let template = TEMPLATES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| PromptError::UnknownPrompt(name.to_string()))?;

    let text = match template.name {
        "weather_report" => format!("What's the weather in {}?", required(arguments, name, "city")?),
        "calculate" => format!("Calculate {}", required(arguments, name, "expression")?),
        _ => {
            let op = required(arguments, name, "operation")?;
            let text = required(arguments, name, "text")?;
            let keyword = transform_keyword(op)?;
            format!("{keyword} {text}")
        }
    };

    Ok(GetPromptResult {
        description: template.description.to_string(),
        messages: vec![PromptMessage {
            role: "user".to_string(),
            content: ContentBlock::Text { text },
        }],
    })
}

fn required<'a>(
    arguments: &'a HashMap<String, String>,
    prompt: &str,
    key: &str,
) -> Result<&'a str, PromptError> {
    arguments
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PromptError::MissingArgument {
            prompt: prompt.to_string(),
            argument: key.to_string(),
        })
}

/// The chat keyword that routes to `op`.
fn transform_keyword(op: &str) -> Result<&'static str, PromptError> {
    let normalized = op.to_lowercase().replace(' ', "_");
    TextOperation::ALL
        .iter()
        .find(|candidate| candidate.as_str() == normalized)
        .map(|candidate| match candidate {
            TextOperation::WordCount => "word count",
            other => other.as_str(),
        })
        .ok_or_else(|| PromptError::InvalidArgument {
            argument: "operation".to_string(),
            reason: format!("unsupported operation '{op}'"),
        })
}
