//! JSON-RPC over HTTP (`POST /mcp`).

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use toolchat_core::ids::SessionId;
use toolchat_rpc::{RpcRequest, RpcResponse};
use tracing::debug;

use crate::errors::ClientError;

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Sends JSON-RPC envelopes to one server.
pub struct RpcTransport {
    http: reqwest::Client,
    base_url: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn endpoint(&self) -> String {
        format!("{}/mcp", self.base_url)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Run `initialize` without a session and return the new session id
    /// with the server's result.
    pub async fn initialize(&self, params: Value) -> Result<(SessionId, Value), ClientError> {
        let request = RpcRequest::new(self.next_id(), "initialize", Some(params));
        let resp = self.http.post(self.endpoint()).json(&request).send().await?;

        let session = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(SessionId::from_raw);
        let result = read_response(resp).await?;
        let session =
            session.ok_or_else(|| ClientError::protocol("initialize response has no session id"))?;
        debug!(session_id = %session, "session initialized");
        Ok((session, result))
    }

    /// Call `method` on `session` and return its result.
    pub async fn request(
        &self,
        session: &SessionId,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, ClientError> {
        let request = RpcRequest::new(self.next_id(), method, params);
        let resp = self
            .http
            .post(self.endpoint())
            .header(SESSION_HEADER, session.as_str())
            .json(&request)
            .send()
            .await?;
        read_response(resp).await
    }

    /// Send a notification. The server answers 202 with no body.
    pub async fn notify(
        &self,
        session: &SessionId,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), ClientError> {
        let request = RpcRequest::notification(method, params);
        let resp = self
            .http
            .post(self.endpoint())
            .header(SESSION_HEADER, session.as_str())
            .json(&request)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(read_response(resp).await.err().unwrap_or_else(|| {
                ClientError::protocol("notification rejected")
            }))
        }
    }

    /// `DELETE /mcp` for `session`.
    pub async fn close_session(&self, session: &SessionId) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.endpoint())
            .header(SESSION_HEADER, session.as_str())
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(read_response(resp).await.err().unwrap_or_else(|| {
                ClientError::protocol("session teardown rejected")
            }))
        }
    }
}

/// Decode a JSON-RPC response body, turning error bodies into [`ClientError::Rpc`].
async fn read_response(resp: reqwest::Response) -> Result<Value, ClientError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let Ok(body) = serde_json::from_slice::<RpcResponse>(&bytes) else {
        return Err(ClientError::protocol(format!(
            "unexpected HTTP {status} response"
        )));
    };
    if let Some(err) = body.error {
        return Err(ClientError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    body.result
        .ok_or_else(|| ClientError::protocol("response has neither result nor error"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let transport = RpcTransport::new(reqwest::Client::new(), "http://localhost:3001/");
        assert_eq!(transport.base_url(), "http://localhost:3001");
        assert_eq!(transport.endpoint(), "http://localhost:3001/mcp");
    }

    #[test]
    fn ids_increase() {
        let transport = RpcTransport::new(reqwest::Client::new(), "http://localhost");
        let a = transport.next_id();
        let b = transport.next_id();
        assert!(b > a);
    }
}
