//! Append-only chat transcript.

use toolchat_core::messages::{ChatMessage, MessageKind, Sender};

/// Messages in arrival order. Only [`clear`](Self::clear) removes entries.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages from `sender`.
    pub fn by_sender(&self, sender: Sender) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(move |m| m.sender() == sender)
    }

    /// Messages of `kind`.
    pub fn by_kind(&self, kind: MessageKind) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(move |m| m.kind() == kind)
    }
}
