//! # toolchat-server
//!
//! Axum HTTP server for toolchat.
//!
//! - `POST /mcp`, `GET /mcp`, `DELETE /mcp`: session-keyed JSON-RPC 2.0
//! - `GET /events`, `DELETE /events/{id}`: one-way SSE push channel
//! - `GET /health`: liveness and counters
//!
//! Both communication modes share one [`TransportRegistry`]. The
//! [`broadcast`] task pushes periodic events to every push channel.

#![deny(unsafe_code)]

pub mod broadcast;
pub mod config;
pub mod errors;
pub mod events;
pub mod health;
pub mod mcp;
pub mod server;
pub mod transport;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use config::{PushIntervals, ServerConfig};
pub use errors::ServerError;
pub use server::{AppState, ServerHandle, build_router, start};
pub use transport::{Channel, ChannelKind, SendOutcome, TransportRegistry};
