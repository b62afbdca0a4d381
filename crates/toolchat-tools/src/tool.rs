use serde_json::Value;
use tokio_util::sync::CancellationToken;
use toolchat_core::ids::SessionId;
use toolchat_core::tools::{ToolDefinition, ToolResult};

/// A built-in tool with a strongly typed argument record.
///
/// Handlers are synchronous and cheap; the executor owns timeouts and
/// cancellation.
pub trait Tool: Send + Sync {
    type Args;

    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;

    fn run(&self, args: &Self::Args) -> ToolResult;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Per-call context handed to the executor.
#[derive(Clone, Debug, Default)]
pub struct ToolContext {
    /// Session the call arrived on, if any.
    pub session_id: Option<SessionId>,
    /// Fires when the owning session closes.
    pub abort_signal: CancellationToken,
}

impl ToolContext {
    pub fn new(session_id: SessionId, abort_signal: CancellationToken) -> Self {
        Self {
            session_id: Some(session_id),
            abort_signal,
        }
    }
}
