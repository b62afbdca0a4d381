//! Session-keyed JSON-RPC endpoint: `POST`, `GET` and `DELETE /mcp`.
//!
//! `initialize` without an `mcp-session-id` header opens a session and
//! returns its id in that header. Every other request must carry a known id.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use toolchat_core::events::ServerEvent;
use toolchat_core::ids::SessionId;
use toolchat_rpc::errors::{INVALID_REQUEST, PARSE_ERROR, SESSION_NOT_FOUND};
use toolchat_rpc::handlers::INITIALIZE;
use toolchat_rpc::types::JSONRPC_VERSION;
use toolchat_rpc::{RpcRequest, RpcResponse};
use tracing::{debug, info, warn};

use crate::events::sse_stream;
use crate::server::AppState;
use crate::transport::ChannelKind;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// `POST /mcp`: handle one JSON-RPC request or notification.
pub async fn post_mcp(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    let id = request.id.clone().unwrap_or(Value::Null);

    let (channel, created) = match session_header(&headers) {
        Some(session_id) => match state.registry.get_kind(&session_id, ChannelKind::Session) {
            Some(channel) => (channel, false),
            None => {
                debug!(session_id = %session_id, method = %request.method, "unknown session id");
                return rejection(
                    StatusCode::BAD_REQUEST,
                    id,
                    SESSION_NOT_FOUND,
                    "Bad Request: unknown session id",
                );
            }
        },
        None if request.method == INITIALIZE && !request.is_notification() => {
            (state.registry.open(ChannelKind::Session), true)
        }
        None => {
            return rejection(
                StatusCode::BAD_REQUEST,
                id,
                SESSION_NOT_FOUND,
                "Bad Request: no valid session id provided",
            );
        }
    };

    let ctx = state.rpc_context(&channel);

    if request.is_notification() {
        if let Err(err) = state.methods.call(&request, &ctx).await {
            debug!(method = %request.method, error = %err, "notification failed");
        }
        return StatusCode::ACCEPTED.into_response();
    }

    let response = state.methods.dispatch(request, &ctx).await;

    if !created {
        return Json(response).into_response();
    }
    if response.is_error() {
        let _ = state.registry.remove(channel.id());
        return Json(response).into_response();
    }

    info!(
        session_id = %channel.id(),
        active_sessions = state.registry.session_count(),
        "session created"
    );
    let mut resp = Json(response).into_response();
    match HeaderValue::from_str(channel.id().as_str()) {
        Ok(value) => {
            let _ = resp.headers_mut().insert(SESSION_HEADER, value);
        }
        Err(err) => warn!(session_id = %channel.id(), error = %err, "session id is not a valid header value"),
    }
    resp
}

/// `GET /mcp`: optional SSE stream for a session. Only one per session.
pub async fn get_mcp(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(channel) = session_header(&headers)
        .and_then(|id| state.registry.get_kind(&id, ChannelKind::Session))
    else {
        return rejection(
            StatusCode::BAD_REQUEST,
            Value::Null,
            SESSION_NOT_FOUND,
            "Bad Request: no valid session id provided",
        );
    };

    let Some(rx) = channel.take_receiver() else {
        return rejection(
            StatusCode::CONFLICT,
            Value::Null,
            INVALID_REQUEST,
            "Conflict: only one SSE stream is allowed per session",
        );
    };

    let _ = channel.send(ServerEvent::connected(channel.id().as_str()));
    debug!(session_id = %channel.id(), "session stream opened");

    Sse::new(sse_stream(rx, channel.closed(), None))
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// `DELETE /mcp`: tear down the session named by the header.
pub async fn delete_mcp(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let removed = session_header(&headers)
        .and_then(|id| state.registry.remove_kind(&id, ChannelKind::Session));

    match removed {
        Some(channel) => {
            info!(
                session_id = %channel.id(),
                active_sessions = state.registry.session_count(),
                "session closed"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        None => rejection(
            StatusCode::BAD_REQUEST,
            Value::Null,
            SESSION_NOT_FOUND,
            "Bad Request: no valid session id provided",
        ),
    }
}

fn session_header(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(SessionId::from_raw)
}

/// Parse a single JSON-RPC request. Batches are not supported.
fn parse_request(body: &[u8]) -> Result<RpcRequest, Response> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "unparseable request body");
        rejection(StatusCode::BAD_REQUEST, Value::Null, PARSE_ERROR, "Parse error")
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    if !value.is_object() {
        return Err(rejection(
            StatusCode::BAD_REQUEST,
            Value::Null,
            INVALID_REQUEST,
            "Invalid Request: expected a single request object",
        ));
    }

    let request: RpcRequest = serde_json::from_value(value).map_err(|err| {
        rejection(
            StatusCode::BAD_REQUEST,
            id.clone(),
            INVALID_REQUEST,
            format!("Invalid Request: {err}"),
        )
    })?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(rejection(
            StatusCode::BAD_REQUEST,
            id,
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ));
    }
    Ok(request)
}

fn rejection(status: StatusCode, id: Value, code: i64, message: impl Into<String>) -> Response {
    (status, Json(RpcResponse::error(id, code, message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> (AppState, Router) {
        let state = AppState::for_tests();
        let router = build_router(state.clone());
        (state, router)
    }

    async fn post(app: &Router, session: Option<&str>, body: &str) -> Response {
        let mut req = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(id) = session {
            req = req.header(SESSION_HEADER, id);
        }
        app.clone()
            .oneshot(req.body(Body::from(body.to_owned())).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn initialize(app: &Router) -> String {
        let resp = post(
            app,
            None,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"test"}}}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()[SESSION_HEADER].to_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn initialize_creates_session_and_returns_header() {
        let (state, app) = app();
        let resp = post(
            &app,
            None,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let session = resp.headers()[SESSION_HEADER].to_str().unwrap().to_owned();
        assert!(session.starts_with("sess_"));

        let body = json_body(resp).await;
        assert_eq!(body["result"]["serverInfo"]["name"], "toolchat");
        assert_eq!(state.registry.session_count(), 1);
    }

    #[tokio::test]
    async fn request_without_session_is_rejected() {
        let (_, app) = app();
        let resp = post(&app, None, r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"]["code"], SESSION_NOT_FOUND);
        assert_eq!(body["id"], 7);
    }

    #[tokio::test]
    async fn request_with_unknown_session_is_rejected() {
        let (_, app) = app();
        let resp = post(
            &app,
            Some("sess_does_not_exist"),
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"]["code"], SESSION_NOT_FOUND);
    }

    #[tokio::test]
    async fn push_client_id_is_not_a_session() {
        let (state, app) = app();
        let push = state.registry.open(ChannelKind::Push);
        let resp = post(
            &app,
            Some(push.id().as_str()),
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let (_, app) = app();
        let resp = post(&app, None, "{ nope").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"]["code"], PARSE_ERROR);
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn batch_and_bad_envelopes_are_invalid_requests() {
        let (_, app) = app();
        for body in [
            r#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#,
            r#"{"jsonrpc":"2.0","id":1}"#,
            r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
        ] {
            let resp = post(&app, None, body).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json_body(resp).await["error"]["code"], INVALID_REQUEST);
        }
    }

    #[tokio::test]
    async fn notification_is_accepted() {
        let (_, app) = app();
        let session = initialize(&app).await;
        let resp = post(
            &app,
            Some(session.as_str()),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn tools_call_runs_calculator() {
        let (_, app) = app();
        let session = initialize(&app).await;
        let body = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "calculator", "arguments": {"operation": "add", "a": 15, "b": 27}}
        });
        let resp = post(&app, Some(session.as_str()), &body.to_string()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["id"], 3);
        assert!(
            body["result"]["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("42")
        );
    }

    #[tokio::test]
    async fn unknown_method_is_rpc_error_with_200() {
        let (_, app) = app();
        let session = initialize(&app).await;
        let resp = post(
            &app,
            Some(session.as_str()),
            r#"{"jsonrpc":"2.0","id":4,"method":"crypto/prices"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn chat_message_dispatches_intent() {
        let (_, app) = app();
        let session = initialize(&app).await;
        let resp = post(
            &app,
            Some(session.as_str()),
            r#"{"jsonrpc":"2.0","id":5,"method":"chat/message","params":{"text":"what is 6 * 7"}}"#,
        )
        .await;
        let body = json_body(resp).await;
        assert_eq!(body["result"]["intent"], "calculator");
        assert!(body["result"]["content"][0]["text"].as_str().unwrap().contains("42"));
    }

    #[tokio::test]
    async fn delete_tears_down_session() {
        let (state, app) = app();
        let session = initialize(&app).await;

        let req = Request::builder()
            .method("DELETE")
            .uri("/mcp")
            .header(SESSION_HEADER, &session)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.registry.session_count(), 0);

        let resp = post(&app, Some(session.as_str()), r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_unknown_or_missing_session_is_bad_request() {
        let (_, app) = app();
        for session in [Some("sess_unknown"), None] {
            let mut req = Request::builder().method("DELETE").uri("/mcp");
            if let Some(id) = session {
                req = req.header(SESSION_HEADER, id);
            }
            let resp = app
                .clone()
                .oneshot(req.body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn second_session_stream_conflicts() {
        let (_, app) = app();
        let session = initialize(&app).await;

        let open = || {
            Request::builder()
                .method("GET")
                .uri("/mcp")
                .header(SESSION_HEADER, &session)
                .body(Body::empty())
                .unwrap()
        };
        let first = app.clone().oneshot(open()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["content-type"], "text/event-stream");

        let second = app.clone().oneshot(open()).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn session_stream_requires_session() {
        let (_, app) = app();
        let req = Request::builder()
            .method("GET")
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
