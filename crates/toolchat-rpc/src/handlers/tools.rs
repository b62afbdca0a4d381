//! Tool handlers: list, call.

use async_trait::async_trait;
use serde_json::{Value, json};
use toolchat_core::tools::ToolCall;
use tracing::instrument;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

pub struct ListToolsHandler;

#[async_trait]
impl MethodHandler for ListToolsHandler {
    async fn handle(&self, _params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(json!({ "tools": ctx.tools.definitions() }))
    }
}

/// Invoke a tool with `{ name, arguments }`.
///
/// Unknown tool names and tool-domain failures come back as results with
/// `isError: true`; malformed arguments are `INVALID_PARAMS`.
pub struct CallToolHandler;

#[async_trait]
impl MethodHandler for CallToolHandler {
    #[instrument(skip_all, fields(method = "tools/call", session_id = %ctx.session_id, tool))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let name = require_string_param(params.as_ref(), "name")?;
        let _ = tracing::Span::current().record("tool", name.as_str());
        let arguments = params.as_ref().and_then(|p| p.get("arguments")).cloned();

        let call = ToolCall::from_parts(&name, arguments)?;
        let result = ctx.tools.execute(&call, &ctx.tool_context()).await?;

        serde_json::to_value(result).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}
