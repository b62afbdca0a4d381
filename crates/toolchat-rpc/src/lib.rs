//! # toolchat-rpc
//!
//! JSON-RPC 2.0 protocol layer, method registry, and handlers.
//!
//! Implements the MCP-style method surface served on `POST /mcp`:
//! - Lifecycle: `initialize`, `notifications/initialized`, `ping`
//! - Tools: `tools/list`, `tools/call`
//! - Resources: `resources/list`, `resources/read`
//! - Prompts: `prompts/list`, `prompts/get`
//! - Chat: `chat/message` (intent dispatch)
//!
//! Session bookkeeping lives in the server; handlers only see the
//! [`RpcContext`] built for the request.

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod handlers;
pub mod registry;
pub mod types;

pub use context::RpcContext;
pub use errors::RpcError;
pub use registry::{MethodHandler, MethodRegistry};
pub use types::{RpcErrorBody, RpcRequest, RpcResponse};
