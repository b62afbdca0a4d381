//! RPC handler modules and registration.

pub mod chat;
pub mod lifecycle;
pub mod prompts;
pub mod resources;
pub mod tools;

use serde_json::Value;

use crate::errors::RpcError;
use crate::registry::MethodRegistry;

pub const INITIALIZE: &str = "initialize";
pub const INITIALIZED: &str = "notifications/initialized";

/// Register all RPC handlers with the registry.
pub fn register_all(registry: &mut MethodRegistry) {
    // Lifecycle
    registry.register(INITIALIZE, lifecycle::InitializeHandler);
    registry.register(INITIALIZED, lifecycle::InitializedHandler);
    registry.register("ping", lifecycle::PingHandler);

    // Tools
    registry.register("tools/list", tools::ListToolsHandler);
    registry.register("tools/call", tools::CallToolHandler);

    // Resources
    registry.register("resources/list", resources::ListResourcesHandler);
    registry.register("resources/read", resources::ReadResourceHandler);

    // Prompts
    registry.register("prompts/list", prompts::ListPromptsHandler);
    registry.register("prompts/get", prompts::GetPromptHandler);

    // Chat
    registry.register("chat/message", chat::ChatMessageHandler);
}

/// Extract a required parameter from the params object.
pub(crate) fn require_param<'a>(params: Option<&'a Value>, key: &str) -> Result<&'a Value, RpcError> {
    params
        .and_then(|p| p.get(key))
        .filter(|v| !v.is_null())
        .ok_or_else(|| RpcError::InvalidParams {
            message: format!("Missing required parameter: {key}"),
        })
}

/// Extract a required string parameter.
pub(crate) fn require_string_param(params: Option<&Value>, key: &str) -> Result<String, RpcError> {
    require_param(params, key)?
        .as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| RpcError::InvalidParams {
            message: format!("Parameter '{key}' must be a string"),
        })
}
