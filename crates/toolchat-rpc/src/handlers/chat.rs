//! Chat handler: classify free text and run the matching tool.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// `{ text }` → `{ intent, content, isError? }`.
pub struct ChatMessageHandler;

#[async_trait]
impl MethodHandler for ChatMessageHandler {
    #[instrument(skip_all, fields(method = "chat/message", session_id = %ctx.session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let text = require_string_param(params.as_ref(), "text")?;
        if text.trim().is_empty() {
            return Err(RpcError::InvalidParams {
                message: "Parameter 'text' must not be empty".into(),
            });
        }

        let outcome = ctx.dispatcher.respond(&text, &ctx.tool_context()).await?;
        serde_json::to_value(outcome).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}
