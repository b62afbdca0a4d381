//! Tool call and tool result types.
//!
//! A [`ToolCall`] is the typed form of the wire envelope
//! `{ "name": ..., "arguments": {...} }`: one variant per known tool, each
//! with its own argument record, plus [`ToolCall::Unknown`] for names the
//! server does not recognize. Results use the MCP content-block shape.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire name of the calculator tool.
pub const CALCULATOR: &str = "calculator";
/// Wire name of the weather tool.
pub const WEATHER: &str = "weather";
/// Wire name of the text transform tool.
pub const TEXT_TRANSFORM: &str = "text_transform";
/// Wire name of the system info tool.
pub const SYSTEM_INFO: &str = "system_info";

/// Arithmetic operation supported by the calculator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// Map an infix symbol to its operation (`x` is accepted for multiply).
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' | 'x' | 'X' | '×' => Some(Self::Multiply),
            '/' | '÷' => Some(Self::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '×',
            Self::Divide => '÷',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatorArgs {
    pub operation: Operation,
    pub a: f64,
    pub b: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherArgs {
    /// Falls back to the configured default city when absent or blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// String transformation applied by the text tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOperation {
    Uppercase,
    Lowercase,
    Reverse,
    Capitalize,
    WordCount,
}

impl TextOperation {
    pub const ALL: [Self; 5] = [
        Self::Uppercase,
        Self::Lowercase,
        Self::Reverse,
        Self::Capitalize,
        Self::WordCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Reverse => "reverse",
            Self::Capitalize => "capitalize",
            Self::WordCount => "word_count",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTransformArgs {
    pub text: String,
    pub operation: TextOperation,
}

/// The system info tool takes no arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfoArgs {}

/// A tool invocation with strongly typed arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolCall {
    Calculator(CalculatorArgs),
    Weather(WeatherArgs),
    TextTransform(TextTransformArgs),
    SystemInfo(SystemInfoArgs),
    /// A name no handler is registered for.
    Unknown { name: String },
}

impl ToolCall {
    /// Build a typed call from the wire envelope.
    ///
    /// Missing `arguments` are treated as `{}`. Unrecognized names become
    /// [`ToolCall::Unknown`]; malformed arguments for a known tool are an error.
    pub fn from_parts(name: &str, arguments: Option<Value>) -> Result<Self, ToolError> {
        let args = match arguments {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(v) => v,
        };
        let call = match name {
            CALCULATOR => Self::Calculator(parse_args(name, args)?),
            WEATHER => Self::Weather(parse_args(name, args)?),
            TEXT_TRANSFORM => Self::TextTransform(parse_args(name, args)?),
            SYSTEM_INFO => Self::SystemInfo(parse_args(name, args)?),
            other => Self::Unknown {
                name: other.to_owned(),
            },
        };
        Ok(call)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Calculator(_) => CALCULATOR,
            Self::Weather(_) => WEATHER,
            Self::TextTransform(_) => TEXT_TRANSFORM,
            Self::SystemInfo(_) => SYSTEM_INFO,
            Self::Unknown { name } => name,
        }
    }

    /// Arguments in wire form.
    pub fn arguments(&self) -> Value {
        let value = match self {
            Self::Calculator(args) => serde_json::to_value(args),
            Self::Weather(args) => serde_json::to_value(args),
            Self::TextTransform(args) => serde_json::to_value(args),
            Self::SystemInfo(args) => serde_json::to_value(args),
            Self::Unknown { .. } => Ok(Value::Object(serde_json::Map::new())),
        };
        value.unwrap_or(Value::Null)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool}: {e}")))
}

/// A single content block of a tool result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

/// Result of a tool call: `{ content: [{ type: "text", text }], isError? }`.
///
/// Tool-domain failures (division by zero, empty operand) are results with
/// `is_error` set, not errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// All text blocks joined with newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Capability-listing entry for a tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_calculator_call() {
        let call = ToolCall::from_parts(
            CALCULATOR,
            Some(json!({"operation": "add", "a": 15, "b": 27})),
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::Calculator(CalculatorArgs {
                operation: Operation::Add,
                a: 15.0,
                b: 27.0,
            })
        );
        assert_eq!(call.name(), "calculator");
    }

    #[test]
    fn missing_arguments_default_to_empty_object() {
        let call = ToolCall::from_parts(SYSTEM_INFO, None).unwrap();
        assert_eq!(call, ToolCall::SystemInfo(SystemInfoArgs {}));

        let call = ToolCall::from_parts(WEATHER, Some(Value::Null)).unwrap();
        assert_eq!(call, ToolCall::Weather(WeatherArgs { city: None }));
    }

    #[test]
    fn unknown_name_becomes_fallback_variant() {
        let call = ToolCall::from_parts("teleport", Some(json!({"to": "mars"}))).unwrap();
        assert_eq!(
            call,
            ToolCall::Unknown {
                name: "teleport".into()
            }
        );
        assert_eq!(call.name(), "teleport");
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let err = ToolCall::from_parts(CALCULATOR, Some(json!({"operation": "modulo", "a": 1, "b": 2})))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("calculator"));

        let err = ToolCall::from_parts(TEXT_TRANSFORM, Some(json!({"text": "hi"}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn operation_symbols() {
        assert_eq!(Operation::from_symbol('+'), Some(Operation::Add));
        assert_eq!(Operation::from_symbol('-'), Some(Operation::Subtract));
        assert_eq!(Operation::from_symbol('x'), Some(Operation::Multiply));
        assert_eq!(Operation::from_symbol('/'), Some(Operation::Divide));
        assert_eq!(Operation::from_symbol('%'), None);
    }

    #[test]
    fn result_omits_is_error_when_false() {
        let json = serde_json::to_value(ToolResult::text("ok")).unwrap();
        assert_eq!(json, json!({"content": [{"type": "text", "text": "ok"}]}));

        let json = serde_json::to_value(ToolResult::error("bad")).unwrap();
        assert_eq!(json["isError"], true);
    }

    #[test]
    fn result_deserializes_without_is_error() {
        let result: ToolResult =
            serde_json::from_value(json!({"content": [{"type": "text", "text": "42"}]})).unwrap();
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "42");
    }

    #[test]
    fn arguments_round_back_to_wire_form() {
        let call = ToolCall::TextTransform(TextTransformArgs {
            text: "hello".into(),
            operation: TextOperation::WordCount,
        });
        assert_eq!(
            call.arguments(),
            json!({"text": "hello", "operation": "word_count"})
        );
    }

    #[test]
    fn definition_uses_input_schema_key() {
        let def = ToolDefinition {
            name: "x".into(),
            description: "y".into(),
            input_schema: json!({"type": "object"}),
        };
        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("inputSchema").is_some());
    }
}
