//! Lifecycle handlers: initialize, notifications/initialized, ping.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::registry::MethodHandler;

/// Protocol revision advertised when the client does not request one.
pub const PROTOCOL_VERSION: &str = "2025-03-26";
pub const SERVER_NAME: &str = "toolchat";

/// Returns server identity and capabilities.
///
/// Session creation happens in the transport before this runs.
pub struct InitializeHandler;

#[async_trait]
impl MethodHandler for InitializeHandler {
    #[instrument(skip_all, fields(method = "initialize", session_id = %ctx.session_id))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let protocol_version = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        let client = params
            .as_ref()
            .and_then(|p| p.pointer("/clientInfo/name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(client, protocol_version, "session initialized");

        Ok(json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
                "prompts": { "listChanged": false },
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
        }))
    }
}

/// Client acknowledgement after `initialize`. Nothing to do.
pub struct InitializedHandler;

#[async_trait]
impl MethodHandler for InitializedHandler {
    async fn handle(&self, _params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(Value::Null)
    }
}

pub struct PingHandler;

#[async_trait]
impl MethodHandler for PingHandler {
    async fn handle(&self, _params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_helpers::make_test_context;

    #[tokio::test]
    async fn initialize_advertises_capabilities() {
        let ctx = make_test_context();
        let result = InitializeHandler.handle(None, &ctx).await.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "toolchat");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());
    }

    #[tokio::test]
    async fn initialize_echoes_requested_version() {
        let ctx = make_test_context();
        let result = InitializeHandler
            .handle(Some(json!({"protocolVersion": "2024-11-05"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let ctx = make_test_context();
        assert_eq!(PingHandler.handle(None, &ctx).await.unwrap(), json!({}));
    }
}
