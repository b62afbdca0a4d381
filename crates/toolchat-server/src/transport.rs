//! Transport registry: session id → open channel.
//!
//! Request/response sessions and one-way push channels live in the same
//! sharded map, distinguished by [`ChannelKind`]. Every channel owns a bounded
//! event queue whose receiving half is parked until a stream claims it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use toolchat_core::events::ServerEvent;
use toolchat_core::ids::SessionId;
use tracing::{debug, warn};

/// What a registry entry is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    /// JSON-RPC session created by `initialize`.
    Session,
    /// One-way SSE push channel.
    Push,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Push => "push",
        }
    }
}

/// Result of queueing an event on a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Queue full; this event was dropped for this channel only.
    Dropped,
    /// The receiving side is gone or the channel was closed.
    Closed,
}

/// An open communication channel.
pub struct Channel {
    id: SessionId,
    kind: ChannelKind,
    created_at: DateTime<Utc>,
    tx: mpsc::Sender<ServerEvent>,
    rx: Mutex<Option<mpsc::Receiver<ServerEvent>>>,
    cancel: CancellationToken,
    dropped: AtomicU64,
}

impl Channel {
    /// Create a channel with a fresh id and a queue of `capacity` events.
    pub fn new(kind: ChannelKind, capacity: usize) -> Self {
        Self::with_id(SessionId::new(), kind, capacity)
    }

    pub fn with_id(id: SessionId, kind: ChannelKind, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            id,
            kind,
            created_at: Utc::now(),
            tx,
            rx: Mutex::new(Some(rx)),
            cancel: CancellationToken::new(),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Token that fires when the channel is closed.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Future resolving when the channel is closed.
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.cancel.clone().cancelled_owned()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Claim the receiving half. Only the first caller gets it.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<ServerEvent>> {
        self.rx.lock().take()
    }

    /// Queue an event without waiting.
    pub fn send(&self, event: ServerEvent) -> SendOutcome {
        if self.cancel.is_cancelled() {
            return SendOutcome::Closed;
        }
        match self.tx.try_send(event) {
            Ok(()) => SendOutcome::Delivered,
            Err(mpsc::error::TrySendError::Full(event)) => {
                let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    client_id = %self.id,
                    event = event.name(),
                    "send queue full, dropping event"
                );
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// Events dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Fire the cancellation token. Streams reading this channel end.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("created_at", &self.created_at)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Registry of every open channel, keyed by id.
pub struct TransportRegistry {
    channels: DashMap<SessionId, Arc<Channel>>,
    max_send_queue: usize,
}

impl TransportRegistry {
    pub fn new(max_send_queue: usize) -> Self {
        Self {
            channels: DashMap::new(),
            max_send_queue,
        }
    }

    /// Create and register a new channel of `kind`.
    pub fn open(&self, kind: ChannelKind) -> Arc<Channel> {
        let channel = Arc::new(Channel::new(kind, self.max_send_queue));
        let _ = self.channels.insert(channel.id().clone(), channel.clone());
        debug!(client_id = %channel.id(), kind = kind.as_str(), "channel registered");
        channel
    }

    /// Register an existing channel under `id`.
    ///
    /// Returns `false` and leaves the map untouched if `id` is taken.
    pub fn register(&self, id: SessionId, channel: Arc<Channel>) -> bool {
        match self.channels.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let _ = slot.insert(channel);
                true
            }
        }
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Channel>> {
        self.channels.get(id).map(|entry| entry.value().clone())
    }

    /// Look up `id` only if it is a channel of `kind`.
    pub fn get_kind(&self, id: &SessionId, kind: ChannelKind) -> Option<Arc<Channel>> {
        self.get(id).filter(|channel| channel.kind() == kind)
    }

    /// Remove and close the channel under `id`. Absent ids yield `None`.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<Channel>> {
        let (_, channel) = self.channels.remove(id)?;
        channel.close();
        debug!(client_id = %id, kind = channel.kind().as_str(), "channel removed");
        Some(channel)
    }

    /// Remove `id` only if it is a channel of `kind`.
    pub fn remove_kind(&self, id: &SessionId, kind: ChannelKind) -> Option<Arc<Channel>> {
        let (_, channel) = self.channels.remove_if(id, |_, channel| channel.kind() == kind)?;
        channel.close();
        debug!(client_id = %id, kind = kind.as_str(), "channel removed");
        Some(channel)
    }

    /// Snapshot of all push channels.
    pub fn push_channels(&self) -> Vec<Arc<Channel>> {
        self.channels
            .iter()
            .filter(|entry| entry.kind() == ChannelKind::Push)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.count(ChannelKind::Session)
    }

    pub fn push_count(&self) -> usize {
        self.count(ChannelKind::Push)
    }

    fn count(&self, kind: ChannelKind) -> usize {
        self.channels.iter().filter(|entry| entry.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Close and drop every channel.
    pub fn close_all(&self) {
        let ids: Vec<SessionId> = self.channels.iter().map(|entry| entry.key().clone()).collect();
        for id in &ids {
            let _ = self.remove(id);
        }
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}
