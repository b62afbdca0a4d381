//! Method registry and async dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::types::{RpcRequest, RpcResponse};

/// Trait implemented by every RPC method handler.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError>;
}

/// Registry mapping method names to handlers.
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, method: &str, handler: impl MethodHandler + 'static) {
        let _ = self.handlers.insert(method.to_owned(), Arc::new(handler));
    }

    /// Maximum time a single RPC handler is allowed to run.
    pub const HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

    /// Run the handler for `request`.
    ///
    /// Fails with `DISCONNECTED` as soon as the context's abort signal fires
    /// and with `INTERNAL_ERROR` once [`HANDLER_TIMEOUT`](Self::HANDLER_TIMEOUT)
    /// elapses.
    pub async fn call(&self, request: &RpcRequest, ctx: &RpcContext) -> Result<Value, RpcError> {
        let method = request.method.as_str();
        let Some(handler) = self.handlers.get(method) else {
            return Err(RpcError::MethodNotFound {
                method: method.to_owned(),
            });
        };

        if ctx.abort_signal.is_cancelled() {
            return Err(RpcError::disconnected());
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            () = ctx.abort_signal.cancelled() => Err(RpcError::disconnected()),
            res = tokio::time::timeout(Self::HANDLER_TIMEOUT, handler.handle(request.params.clone(), ctx)) => {
                res.unwrap_or_else(|_elapsed| {
                    tracing::error!(method, "RPC handler timed out after {:?}", Self::HANDLER_TIMEOUT);
                    Err(RpcError::Internal {
                        message: format!("Handler for '{method}' timed out"),
                    })
                })
            }
        };

        let duration = start.elapsed();
        if duration.as_secs() >= 5 {
            warn!(method, duration_secs = duration.as_secs_f64(), "slow RPC request");
        }
        outcome
    }

    /// Dispatch a request and wrap the outcome in a response envelope.
    pub async fn dispatch(&self, request: RpcRequest, ctx: &RpcContext) -> RpcResponse {
        let id = request.id.clone().unwrap_or(Value::Null);
        match self.call(&request, ctx).await {
            Ok(result) => RpcResponse::success(id, result),
            Err(err) => {
                debug!(method = %request.method, code = err.code(), error = %err, "RPC request failed");
                RpcResponse::from_error_body(id, err.to_error_body())
            }
        }
    }

    /// List all registered method names (sorted).
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}
