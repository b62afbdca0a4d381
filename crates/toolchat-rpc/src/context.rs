//! RPC dependency-injection context.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use toolchat_core::ids::SessionId;
use toolchat_intent::Dispatcher;
use toolchat_tools::{ToolContext, ToolExecutor};

/// Context passed to every RPC handler.
///
/// Built per request by the transport: the shared services are `Arc`s, the
/// session fields identify the channel the request arrived on.
#[derive(Clone)]
pub struct RpcContext {
    /// Session the request belongs to.
    pub session_id: SessionId,
    /// Fires when the session is torn down.
    pub abort_signal: CancellationToken,
    pub tools: Arc<ToolExecutor>,
    pub dispatcher: Arc<Dispatcher>,
    /// When the server started (for uptime calculation).
    pub server_start_time: Instant,
}

impl RpcContext {
    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(self.session_id.clone(), self.abort_signal.clone())
    }
}
