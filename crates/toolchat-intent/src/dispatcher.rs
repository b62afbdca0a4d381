use std::sync::Arc;

use serde::{Deserialize, Serialize};
use toolchat_core::tools::{
    SystemInfoArgs, TextTransformArgs, ToolCall, ToolError, ToolResult, WeatherArgs,
};
use toolchat_tools::resources::HELP_TEXT;
use toolchat_tools::{ToolContext, ToolExecutor};
use tracing::debug;

use crate::classifier::Classifier;
use crate::extract;
use crate::intent::Intent;

/// Returned when a calculator message holds no `<n> <op> <n>` expression.
pub const CALCULATOR_USAGE: &str =
    "I couldn't find a calculation. Try something like \"calculate 15 + 27\" or \"6 * 7\".";

const CAPABILITY_HINT: &str = "I can do calculations, weather lookups, text transforms \
    (uppercase, lowercase, reverse, capitalize, word count) and system info. Type \"help\" for examples.";

/// What to do with a classified message.
#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    /// Invoke a tool.
    Call(ToolCall),
    /// Answer directly without a tool.
    Reply(ToolResult),
}

/// Classified intent plus the text result. Serializes as
/// `{ intent, content, isError? }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub intent: Intent,
    #[serde(flatten)]
    pub result: ToolResult,
}

/// Classifies chat text and runs the matching tool.
pub struct Dispatcher {
    classifier: Classifier,
    tools: Arc<ToolExecutor>,
}

impl Dispatcher {
    pub fn new(tools: Arc<ToolExecutor>) -> Self {
        Self::with_classifier(Classifier::default(), tools)
    }

    pub fn with_classifier(classifier: Classifier, tools: Arc<ToolExecutor>) -> Self {
        Self { classifier, tools }
    }

    pub fn classify(&self, text: &str) -> Intent {
        self.classifier.classify(text)
    }

    /// Turn a classified message into a tool call or a direct reply.
    pub fn plan(&self, intent: Intent, text: &str) -> Plan {
        match intent {
            Intent::Calculator => match extract::calculation(text) {
                Some(args) => Plan::Call(ToolCall::Calculator(args)),
                None => Plan::Reply(ToolResult::error(CALCULATOR_USAGE)),
            },
            Intent::Weather => Plan::Call(ToolCall::Weather(WeatherArgs {
                city: extract::city(text),
            })),
            Intent::TextTransform => match extract::text_transform(text) {
                Some((operation, operand)) => Plan::Call(ToolCall::TextTransform(TextTransformArgs {
                    text: operand,
                    operation,
                })),
                None => Plan::Reply(fallback(text)),
            },
            Intent::SystemInfo => Plan::Call(ToolCall::SystemInfo(SystemInfoArgs {})),
            Intent::Help => Plan::Reply(ToolResult::text(HELP_TEXT)),
            Intent::Fallback => Plan::Reply(fallback(text)),
        }
    }

    /// Classify `text`, run the selected handler and return its result.
    ///
    /// Tool-domain failures come back as results with `is_error` set; only
    /// cancellation and timeouts are errors.
    pub async fn respond(&self, text: &str, ctx: &ToolContext) -> Result<DispatchOutcome, ToolError> {
        let intent = self.classify(text);
        debug!(%intent, "classified chat message");

        let result = match self.plan(intent, text) {
            Plan::Call(call) => self.tools.execute(&call, ctx).await?,
            Plan::Reply(result) => result,
        };
        Ok(DispatchOutcome { intent, result })
    }
}

fn fallback(text: &str) -> ToolResult {
    ToolResult::text(format!("You said: \"{}\". {CAPABILITY_HINT}", text.trim()))
}
