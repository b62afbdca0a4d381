//! SSE push channel: `GET /events` and `DELETE /events/{id}`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::WaitForCancellationFutureOwned;
use toolchat_core::events::ServerEvent;
use toolchat_core::ids::SessionId;
use tracing::{error, info};

use crate::server::AppState;
use crate::transport::{ChannelKind, TransportRegistry};

/// Removes a push channel from the registry when its stream is dropped.
pub(crate) struct DeregisterOnDrop {
    registry: Arc<TransportRegistry>,
    id: SessionId,
}

impl Drop for DeregisterOnDrop {
    fn drop(&mut self) {
        if self.registry.remove_kind(&self.id, ChannelKind::Push).is_some() {
            info!(client_id = %self.id, "push client disconnected");
        }
    }
}

pub(crate) fn to_sse_event(event: &ServerEvent) -> Event {
    Event::default().event(event.name()).data(event.data().to_string())
}

/// Turn a channel's queue into an SSE stream that ends when the channel closes.
///
/// `guard` lives as long as the stream.
pub(crate) fn sse_stream(
    rx: mpsc::Receiver<ServerEvent>,
    closed: WaitForCancellationFutureOwned,
    guard: Option<DeregisterOnDrop>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event = rx.recv().await?;
        Some((Ok(to_sse_event(&event)), (rx, guard)))
    })
    .take_until(closed)
}

/// `GET /events`: register a push channel and stream its events.
///
/// The first event is `connected`, carrying the `clientId` used to
/// deregister.
pub async fn subscribe(State(state): State<AppState>) -> Response {
    let channel = state.registry.open(ChannelKind::Push);
    let Some(rx) = channel.take_receiver() else {
        error!(client_id = %channel.id(), "fresh push channel had no receiver");
        let _ = state.registry.remove(channel.id());
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let _ = channel.send(ServerEvent::connected(channel.id().as_str()));
    info!(
        client_id = %channel.id(),
        push_clients = state.registry.push_count(),
        "push client connected"
    );

    let guard = DeregisterOnDrop {
        registry: state.registry.clone(),
        id: channel.id().clone(),
    };
    let stream = sse_stream(rx, channel.closed(), Some(guard));
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// `DELETE /events/{id}`: deregister a push channel. Unknown ids are a no-op.
pub async fn unsubscribe(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let id = SessionId::from_raw(id);
    if state.registry.remove_kind(&id, ChannelKind::Push).is_some() {
        info!(client_id = %id, "push client deregistered");
    }
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn drop_guard_removes_push_channel() {
        let registry = Arc::new(TransportRegistry::default());
        let channel = registry.open(ChannelKind::Push);
        let guard = DeregisterOnDrop {
            registry: registry.clone(),
            id: channel.id().clone(),
        };
        drop(guard);
        assert!(registry.get(channel.id()).is_none());
        assert!(channel.is_closed());
    }

    #[test]
    fn drop_guard_ignores_session_channels() {
        let registry = Arc::new(TransportRegistry::default());
        let session = registry.open(ChannelKind::Session);
        drop(DeregisterOnDrop {
            registry: registry.clone(),
            id: session.id().clone(),
        });
        assert!(registry.get(session.id()).is_some());
    }

    #[tokio::test]
    async fn stream_yields_queued_events_then_ends_on_close() {
        let (tx, rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        tx.send(ServerEvent::heartbeat()).await.unwrap();

        let mut stream = Box::pin(sse_stream(rx, token.clone().cancelled_owned(), None));
        assert!(stream.next().await.is_some());

        token.cancel();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_stream_runs_guard() {
        let registry = Arc::new(TransportRegistry::default());
        let channel = registry.open(ChannelKind::Push);
        let rx = channel.take_receiver().unwrap();
        let guard = DeregisterOnDrop {
            registry: registry.clone(),
            id: channel.id().clone(),
        };

        let stream = sse_stream(rx, channel.closed(), Some(guard));
        assert_eq!(registry.push_count(), 1);
        drop(stream);
        assert_eq!(registry.push_count(), 0);
    }
}
