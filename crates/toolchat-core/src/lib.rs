//! # toolchat-core
//!
//! Foundation types shared by the server, the intent dispatcher and the
//! client façade:
//!
//! - branded ids ([`ids`])
//! - transcript messages ([`messages`])
//! - typed tool calls and MCP-shaped tool results ([`tools`])
//! - push-channel events ([`events`])

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod messages;
pub mod tools;
