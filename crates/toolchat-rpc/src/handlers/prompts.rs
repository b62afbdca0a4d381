//! Prompt handlers: list, get.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};
use toolchat_tools::prompts;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

pub struct ListPromptsHandler;

#[async_trait]
impl MethodHandler for ListPromptsHandler {
    async fn handle(&self, _params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(json!({ "prompts": prompts::list() }))
    }
}

/// Render a template with `{ name, arguments }`. Argument values must be strings.
pub struct GetPromptHandler;

#[async_trait]
impl MethodHandler for GetPromptHandler {
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let name = require_string_param(params.as_ref(), "name")?;
        let arguments: HashMap<String, String> = match params.as_ref().and_then(|p| p.get("arguments")) {
            None | Some(Value::Null) => HashMap::new(),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| RpcError::InvalidParams {
                message: format!("Invalid prompt arguments: {e}"),
            })?,
        };

        let rendered = prompts::get(&name, &arguments).map_err(|e| RpcError::InvalidParams {
            message: e.to_string(),
        })?;
        serde_json::to_value(rendered).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}
