//! Transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// How the transcript should present a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text (user input, help text, push updates).
    Text,
    /// Output of a tool handler.
    ToolResult,
    /// Tool-domain or client-side error.
    Error,
}

/// A single transcript entry. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    id: MessageId,
    content: String,
    sender: Sender,
    kind: MessageKind,
    created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender,
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, MessageKind::Text, content)
    }

    pub fn assistant(kind: MessageKind, content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, kind, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, MessageKind::Error, content)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
