//! Resource handlers: list, read.

use async_trait::async_trait;
use serde_json::{Value, json};
use toolchat_tools::resources;

use crate::context::RpcContext;
use crate::errors::{self, RpcError};
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

pub struct ListResourcesHandler;

#[async_trait]
impl MethodHandler for ListResourcesHandler {
    async fn handle(&self, _params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(json!({ "resources": resources::list() }))
    }
}

/// Returns `{ contents: [{ uri, mimeType, text }] }` for a known uri.
pub struct ReadResourceHandler;

#[async_trait]
impl MethodHandler for ReadResourceHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let uri = require_string_param(params.as_ref(), "uri")?;
        let contents = resources::read(&uri, &ctx.tools).map_err(|e| RpcError::NotFound {
            code: errors::RESOURCE_NOT_FOUND,
            message: e.to_string(),
        })?;
        Ok(json!({ "contents": [contents] }))
    }
}
