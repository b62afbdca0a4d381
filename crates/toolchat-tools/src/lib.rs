//! # toolchat-tools
//!
//! The four built-in tools and the static MCP catalog around them.
//!
//! Each tool implements [`Tool`] with its own typed argument record; the
//! [`ToolExecutor`] matches a [`ToolCall`](toolchat_core::tools::ToolCall)
//! variant to its handler and bounds the call with a timeout and the
//! caller's cancellation token.

#![deny(unsafe_code)]

pub mod calculator;
pub mod executor;
pub mod prompts;
pub mod resources;
pub mod system;
pub mod text;
pub mod tool;
pub mod weather;

pub use executor::ToolExecutor;
pub use tool::{Tool, ToolContext};
