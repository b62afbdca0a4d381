//! # toolchat-client
//!
//! Client façade for a toolchat server. [`ChatClient`] keeps an in-memory
//! [`Transcript`], forwards user input to the server's `chat/message` method
//! and appends push-channel updates as they arrive.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod push;
pub mod rpc;
pub mod transcript;

pub use client::ChatClient;
pub use errors::ClientError;
pub use transcript::Transcript;
