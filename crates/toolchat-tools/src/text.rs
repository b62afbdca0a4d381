use serde_json::{Value, json};
use toolchat_core::tools::{TEXT_TRANSFORM, TextOperation, TextTransformArgs, ToolResult};

use crate::tool::Tool;

/// Shown when the operand is empty.
pub const EMPTY_TEXT_PROMPT: &str = "Please provide some text to transform.";

pub struct TextTransformTool;

impl Tool for TextTransformTool {
    type Args = TextTransformArgs;

    fn name(&self) -> &'static str {
        TEXT_TRANSFORM
    }

    fn description(&self) -> &'static str {
        "Transform text: uppercase, lowercase, reverse, capitalize, or count words"
    }

    fn input_schema(&self) -> Value {
        let operations: Vec<&str> = TextOperation::ALL.iter().map(|op| op.as_str()).collect();
        json!({
            "type": "object",
            "required": ["text", "operation"],
            "properties": {
                "text": { "type": "string", "description": "Text to transform" },
                "operation": {
                    "type": "string",
                    "enum": operations,
                    "description": "Transformation to apply"
                }
            }
        })
    }

    fn run(&self, args: &TextTransformArgs) -> ToolResult {
        let text = args.text.trim();
        if text.is_empty() {
            return ToolResult::error(EMPTY_TEXT_PROMPT);
        }
        ToolResult::text(transform(text, args.operation))
    }
}

pub fn transform(text: &str, operation: TextOperation) -> String {
    match operation {
        TextOperation::Uppercase => text.to_uppercase(),
        TextOperation::Lowercase => text.to_lowercase(),
        TextOperation::Reverse => text.chars().rev().collect(),
        TextOperation::Capitalize => text
            .split_whitespace()
            .map(capitalize_word)
            .collect::<Vec<_>>()
            .join(" "),
        TextOperation::WordCount => {
            let words = text.split_whitespace().count();
            let chars = text.chars().count();
            format!("Word count: {words} (characters: {chars})")
        }
    }
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
