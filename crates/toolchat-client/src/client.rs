//! The chat client façade.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use toolchat_core::events::ServerEvent;
use toolchat_core::ids::SessionId;
use toolchat_core::messages::{ChatMessage, MessageKind};
use toolchat_core::tools::{ToolCall, ToolResult};
use toolchat_intent::{DispatchOutcome, Intent};
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::push;
use crate::rpc::RpcTransport;
use crate::transcript::Transcript;

/// How long `connect` waits for the push channel's `connected` event.
const PUSH_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the [`ChatClient::subscribe`] feed.
const UPDATE_BUFFER: usize = 256;

const NOT_CONNECTED_TEXT: &str = "Not connected to the server. Connect first.";
const BUSY_TEXT: &str = "Still waiting for the previous reply. Please wait.";
const CONNECTION_LOST_TEXT: &str = "Lost connection to the server. Reconnect to continue.";

/// Appends to the transcript and republishes to subscribers.
#[derive(Clone)]
struct TranscriptSink {
    transcript: Arc<Mutex<Transcript>>,
    updates: broadcast::Sender<ChatMessage>,
}

impl TranscriptSink {
    fn append(&self, message: ChatMessage) {
        self.transcript.lock().push(message.clone());
        let _ = self.updates.send(message);
    }
}

/// Live connection state.
struct Connection {
    session_id: SessionId,
    push_client_id: Option<String>,
    stop: CancellationToken,
    push_task: Option<JoinHandle<()>>,
}

/// Clears the in-flight flag when a send finishes, however it finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Chat client for one toolchat server.
///
/// Holds at most one session and one push subscription. At most one
/// [`send_message`](Self::send_message) is outstanding at a time.
pub struct ChatClient {
    rpc: Arc<RpcTransport>,
    sink: TranscriptSink,
    connection: Arc<Mutex<Option<Connection>>>,
    in_flight: AtomicBool,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Self {
            rpc: Arc::new(RpcTransport::new(http, base_url)),
            sink: TranscriptSink {
                transcript: Arc::new(Mutex::new(Transcript::new())),
                updates,
            },
            connection: Arc::new(Mutex::new(None)),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        self.rpc.base_url()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.connection.lock().as_ref().map(|c| c.session_id.clone())
    }

    /// Push channel id assigned by the server's `connected` event.
    pub fn push_client_id(&self) -> Option<String> {
        self.connection
            .lock()
            .as_ref()
            .and_then(|c| c.push_client_id.clone())
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Transcript {
        self.sink.transcript.lock().clone()
    }

    /// Every message appended from now on, including push updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.sink.updates.subscribe()
    }

    pub fn clear(&self) {
        self.sink.transcript.lock().clear();
    }

    /// Open a session and subscribe to the push channel. No-op when connected.
    pub async fn connect(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            return Ok(());
        }

        let params = json!({
            "clientInfo": { "name": "toolchat-client", "version": env!("CARGO_PKG_VERSION") }
        });
        let (session_id, _server_info) = self.rpc.initialize(params).await?;

        if let Err(e) = self
            .rpc
            .notify(&session_id, "notifications/initialized", None)
            .await
        {
            let _ = self.rpc.close_session(&session_id).await;
            return Err(e);
        }

        let stop = CancellationToken::new();
        let (push_client_id, push_task) = match self.open_push(session_id.clone(), stop.clone()).await {
            Ok(push) => push,
            Err(e) => {
                let _ = self.rpc.close_session(&session_id).await;
                return Err(e);
            }
        };

        let connection = Connection {
            session_id,
            push_client_id: Some(push_client_id),
            stop,
            push_task: Some(push_task),
        };

        // A cancelled token here means the push stream already ended.
        let lost = connection.stop.is_cancelled();
        let duplicate = {
            let mut slot = self.connection.lock();
            if lost || slot.is_some() {
                Some(connection)
            } else {
                info!(session_id = %connection.session_id, "connected");
                *slot = Some(connection);
                None
            }
        };
        if let Some(extra) = duplicate {
            if lost {
                let _ = self.teardown(extra).await;
                return Err(ClientError::protocol("push stream closed while connecting"));
            }
            // Another connect won the race; drop ours.
            self.teardown(extra).await?;
        }
        Ok(())
    }

    /// Close the session and the push subscription. No-op when disconnected.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        let Some(connection) = self.connection.lock().take() else {
            return Ok(());
        };
        info!(session_id = %connection.session_id, "disconnecting");
        self.teardown(connection).await
    }

    async fn teardown(&self, connection: Connection) -> Result<(), ClientError> {
        connection.stop.cancel();
        let mut first_error = None;

        if let Err(e) = self.rpc.close_session(&connection.session_id).await {
            warn!(session_id = %connection.session_id, error = %e, "session teardown failed");
            first_error = Some(e);
        }

        if let Some(client_id) = &connection.push_client_id {
            let url = format!("{}/events/{client_id}", self.rpc.base_url());
            match self.rpc.http().delete(url).send().await {
                Ok(resp) => debug!(client_id = %client_id, status = %resp.status(), "push channel deregistered"),
                Err(e) => {
                    warn!(client_id = %client_id, error = %e, "push deregistration failed");
                    if first_error.is_none() {
                        first_error = Some(e.into());
                    }
                }
            }
        }

        if let Some(task) = connection.push_task {
            let _ = task.await;
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Subscribe to `GET /events` and spawn the task appending push updates.
    ///
    /// If the server ends the stream, the task drops the connection for
    /// `session_id` and closes that session, so later sends fail locally.
    async fn open_push(
        &self,
        session_id: SessionId,
        stop: CancellationToken,
    ) -> Result<(String, JoinHandle<()>), ClientError> {
        let resp = self
            .rpc
            .http()
            .get(format!("{}/events", self.rpc.base_url()))
            .send()
            .await?
            .error_for_status()?;
        let mut events = Box::pin(resp.bytes_stream().eventsource());

        let first = tokio::time::timeout(PUSH_HANDSHAKE_TIMEOUT, events.next())
            .await
            .map_err(|_| ClientError::protocol("timed out waiting for push channel"))?;
        let client_id = match first {
            Some(Ok(event)) => match ServerEvent::from_sse(&event.event, &event.data) {
                Some(ServerEvent::Connected(payload)) => payload.client_id,
                _ => {
                    return Err(ClientError::protocol(format!(
                        "push stream started with '{}' instead of 'connected'",
                        event.event
                    )));
                }
            },
            Some(Err(e)) => return Err(ClientError::protocol(format!("push stream error: {e}"))),
            None => return Err(ClientError::protocol("push stream closed during handshake")),
        };
        debug!(client_id = %client_id, "push channel open");

        let sink = self.sink.clone();
        let rpc = Arc::clone(&self.rpc);
        let connection = Arc::clone(&self.connection);
        let task = tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    () = stop.cancelled() => break,
                    item = events.next() => item,
                };
                match item {
                    Some(Ok(event)) => match ServerEvent::from_sse(&event.event, &event.data) {
                        Some(event) => {
                            if let Some(text) = push::render(&event) {
                                sink.append(ChatMessage::assistant(MessageKind::Text, text));
                            }
                        }
                        None => debug!(event = %event.event, "ignoring unknown push event"),
                    },
                    Some(Err(e)) => {
                        warn!(error = %e, "push stream failed");
                        break;
                    }
                    None => {
                        debug!("push stream ended");
                        break;
                    }
                }
            }
            if stop.is_cancelled() {
                return;
            }
            stop.cancel();

            let dropped = {
                let mut slot = connection.lock();
                if slot.as_ref().is_some_and(|c| c.session_id == session_id) {
                    slot.take()
                } else {
                    None
                }
            };
            if dropped.is_some() {
                warn!(session_id = %session_id, "push stream lost, disconnecting");
                sink.append(ChatMessage::error(CONNECTION_LOST_TEXT));
                if let Err(e) = rpc.close_session(&session_id).await {
                    debug!(session_id = %session_id, error = %e, "session already gone");
                }
            }
        });

        Ok((client_id, task))
    }

    /// Send user text to the server's intent dispatcher.
    ///
    /// The user message and the reply are appended to the transcript. When
    /// not connected, or while a previous send is in flight, nothing is sent
    /// and an error message is appended instead.
    pub async fn send_message(&self, text: &str) -> Result<DispatchOutcome, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let Some(session_id) = self.session_id() else {
            self.sink.append(ChatMessage::error(NOT_CONNECTED_TEXT));
            return Err(ClientError::NotConnected);
        };

        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.sink.append(ChatMessage::error(BUSY_TEXT));
            return Err(ClientError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.sink.append(ChatMessage::user(text));

        let reply = self
            .rpc
            .request(&session_id, "chat/message", Some(json!({ "text": text })))
            .await
            .and_then(|value| {
                serde_json::from_value::<DispatchOutcome>(value)
                    .map_err(|e| ClientError::protocol(format!("bad chat reply: {e}")))
            });

        match reply {
            Ok(outcome) => {
                self.sink.append(reply_message(&outcome));
                Ok(outcome)
            }
            Err(e) => {
                self.sink.append(ChatMessage::error(format!("Error: {e}")));
                Err(e)
            }
        }
    }

    /// Call a tool directly (`tools/call`). The transcript is not touched.
    pub async fn call_tool(&self, call: &ToolCall) -> Result<ToolResult, ClientError> {
        let params = json!({ "name": call.name(), "arguments": call.arguments() });
        let value = self.request("tools/call", Some(params)).await?;
        serde_json::from_value(value).map_err(|e| ClientError::protocol(format!("bad tool result: {e}")))
    }

    /// Raw JSON-RPC call on the current session.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let session_id = self.session_id().ok_or(ClientError::NotConnected)?;
        self.rpc.request(&session_id, method, params).await
    }
}

fn reply_message(outcome: &DispatchOutcome) -> ChatMessage {
    let kind = if outcome.result.is_error {
        MessageKind::Error
    } else {
        match outcome.intent {
            Intent::Help | Intent::Fallback => MessageKind::Text,
            _ => MessageKind::ToolResult,
        }
    };
    ChatMessage::assistant(kind, outcome.result.joined_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchat_core::messages::Sender;

    /// Client pointed at a closed port; nothing here touches the network.
    fn offline_client() -> ChatClient {
        ChatClient::new("http://127.0.0.1:9")
    }

    fn fake_connection(client: &ChatClient) {
        *client.connection.lock() = Some(Connection {
            session_id: SessionId::from_raw("sess_fake"),
            push_client_id: None,
            stop: CancellationToken::new(),
            push_task: None,
        });
    }

    #[tokio::test]
    async fn send_while_disconnected_appends_error() {
        let client = offline_client();
        let err = client.send_message("hello").await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));

        let transcript = client.transcript();
        assert_eq!(transcript.len(), 1);
        let msg = transcript.last().unwrap();
        assert_eq!(msg.kind(), MessageKind::Error);
        assert_eq!(msg.content(), NOT_CONNECTED_TEXT);
    }

    #[tokio::test]
    async fn send_while_in_flight_is_rejected() {
        let client = offline_client();
        fake_connection(&client);
        client.in_flight.store(true, Ordering::Release);

        let err = client.send_message("2 + 2").await.unwrap_err();
        assert!(matches!(err, ClientError::Busy));

        let transcript = client.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().content(), BUSY_TEXT);
        assert_eq!(transcript.by_sender(Sender::User).count(), 0);
    }

    #[tokio::test]
    async fn empty_input_is_ignored() {
        let client = offline_client();
        let err = client.send_message("   ").await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyMessage));
        assert!(client.transcript().is_empty());
    }

    #[tokio::test]
    async fn failed_request_appends_error_and_clears_flag() {
        let client = offline_client();
        fake_connection(&client);

        let err = client.send_message("what is 1 + 1").await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
        assert!(!client.in_flight.load(Ordering::Acquire));

        let transcript = client.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].sender(), Sender::User);
        assert_eq!(transcript.messages()[1].kind(), MessageKind::Error);
    }

    #[tokio::test]
    async fn disconnect_when_not_connected_is_noop() {
        let client = offline_client();
        client.disconnect().await.unwrap();
        assert!(!client.is_connected());
    }

    #[test]
    fn subscribers_see_appended_messages() {
        let client = offline_client();
        let mut rx = client.subscribe();
        client.sink.append(ChatMessage::user("hi"));
        assert_eq!(rx.try_recv().unwrap().content(), "hi");
    }

    #[test]
    fn clear_empties_transcript() {
        let client = offline_client();
        client.sink.append(ChatMessage::user("hi"));
        client.clear();
        assert!(client.transcript().is_empty());
    }

    #[test]
    fn reply_kind_follows_intent_and_error_flag() {
        let outcome = |intent, result| DispatchOutcome { intent, result };
        assert_eq!(
            reply_message(&outcome(Intent::Calculator, ToolResult::text("42"))).kind(),
            MessageKind::ToolResult
        );
        assert_eq!(
            reply_message(&outcome(Intent::Help, ToolResult::text("help"))).kind(),
            MessageKind::Text
        );
        assert_eq!(
            reply_message(&outcome(Intent::Calculator, ToolResult::error("div by zero"))).kind(),
            MessageKind::Error
        );
    }
}
