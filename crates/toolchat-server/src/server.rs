//! Router assembly and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{delete, get};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use toolchat_intent::Dispatcher;
use toolchat_rpc::handlers::register_all;
use toolchat_rpc::{MethodRegistry, RpcContext};
use toolchat_tools::ToolExecutor;
use tracing::{error, info, warn};

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::health::{HealthResponse, health_check};
use crate::transport::{Channel, TransportRegistry};
use crate::{events, mcp};

/// Time allowed for in-flight work after shutdown is requested.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TransportRegistry>,
    pub methods: Arc<MethodRegistry>,
    pub tools: Arc<ToolExecutor>,
    pub dispatcher: Arc<Dispatcher>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: &ServerConfig, tools: Arc<ToolExecutor>) -> Self {
        let mut methods = MethodRegistry::new();
        register_all(&mut methods);
        Self {
            registry: Arc::new(TransportRegistry::new(config.max_send_queue)),
            methods: Arc::new(methods),
            dispatcher: Arc::new(Dispatcher::new(tools.clone())),
            tools,
            start_time: Instant::now(),
        }
    }

    /// Context for a request arriving on `channel`.
    pub fn rpc_context(&self, channel: &Channel) -> RpcContext {
        RpcContext {
            session_id: channel.id().clone(),
            abort_signal: channel.cancel_token(),
            tools: self.tools.clone(),
            dispatcher: self.dispatcher.clone(),
            server_start_time: self.start_time,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        let settings = toolchat_settings::ToolSettings::default();
        Self::new(&ServerConfig::default(), Arc::new(ToolExecutor::new(&settings)))
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", get(mcp::get_mcp).post(mcp::post_mcp).delete(mcp::delete_mcp))
        .route("/events", get(events::subscribe))
        .route("/events/{id}", delete(events::unsubscribe))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_check(
        state.start_time,
        state.registry.session_count(),
        state.registry.push_count(),
    ))
}

/// Bind the listener, start serving and start the push broadcaster.
pub async fn start(config: ServerConfig, tools: Arc<ToolExecutor>) -> Result<ServerHandle, ServerError> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let state = AppState::new(&config, tools.clone());
    let registry = state.registry.clone();
    let shutdown = CancellationToken::new();

    let router = build_router(state);
    let serve_token = shutdown.clone();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(serve_token.cancelled_owned())
            .await;
        if let Err(e) = result {
            error!(error = %e, "server exited with error");
        }
    });

    let push = Broadcaster::new(registry.clone()).spawn(tools, config.push, shutdown.clone());

    info!(addr = %local_addr, "toolchat server started");

    Ok(ServerHandle {
        addr: local_addr,
        registry,
        shutdown,
        tasks: vec![server, push],
    })
}

/// Handle returned by [`start`]. Owns the background tasks.
pub struct ServerHandle {
    addr: SocketAddr,
    registry: Arc<TransportRegistry>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Base URL, e.g. `http://127.0.0.1:3001`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn registry(&self) -> &Arc<TransportRegistry> {
        &self.registry
    }

    /// Stop the broadcaster, close every channel and drain the listener.
    pub async fn shutdown(self) {
        info!("shutting down");
        self.shutdown.cancel();
        self.registry.close_all();
        drain(self.tasks, SHUTDOWN_TIMEOUT).await;
        info!("server stopped");
    }
}

/// Wait up to `timeout` for `tasks`, aborting whatever is still running.
async fn drain(tasks: Vec<JoinHandle<()>>, timeout: Duration) {
    info!(task_count = tasks.len(), "waiting for tasks to complete");
    let aborts: Vec<_> = tasks.iter().map(JoinHandle::abort_handle).collect();

    if tokio::time::timeout(timeout, futures::future::join_all(tasks))
        .await
        .is_err()
    {
        warn!(?timeout, "shutdown timed out, aborting remaining tasks");
        for handle in aborts {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelKind;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn make_router() -> (AppState, Router) {
        let state = AppState::for_tests();
        (state.clone(), build_router(state))
    }

    #[test]
    fn state_registers_every_method() {
        let state = AppState::for_tests();
        for method in [
            "initialize",
            "notifications/initialized",
            "ping",
            "tools/list",
            "tools/call",
            "resources/list",
            "resources/read",
            "prompts/list",
            "prompts/get",
            "chat/message",
        ] {
            assert!(state.methods.has_method(method), "{method}");
        }
    }

    #[tokio::test]
    async fn health_endpoint_reports_counts() {
        let (state, app) = make_router();
        let _session = state.registry.open(ChannelKind::Session);
        let _push = state.registry.open(ChannelKind::Push);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["activeSessions"], 1);
        assert_eq!(parsed["pushClients"], 1);
        assert!(parsed["uptimeSecs"].is_number());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (_, app) = make_router();
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn events_endpoint_registers_push_channel() {
        let (state, app) = make_router();
        let req = Request::builder()
            .uri("/events")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/event-stream");
        assert_eq!(state.registry.push_count(), 1);

        drop(resp);
        assert_eq!(state.registry.push_count(), 0);
    }

    #[tokio::test]
    async fn deleting_push_channel_is_silent_for_unknown_ids() {
        let (state, app) = make_router();
        let push = state.registry.open(ChannelKind::Push);

        for id in [push.id().as_str().to_owned(), "sess_unknown".to_owned()] {
            let req = Request::builder()
                .method("DELETE")
                .uri(format!("/events/{id}"))
                .body(Body::empty())
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        }
        assert_eq!(state.registry.push_count(), 0);
    }

    #[tokio::test]
    async fn deleting_push_route_never_removes_sessions() {
        let (state, app) = make_router();
        let session = state.registry.open(ChannelKind::Session);
        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/events/{}", session.id()))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.registry.session_count(), 1);
    }

    #[tokio::test]
    async fn start_binds_ephemeral_port_and_shuts_down() {
        let settings = toolchat_settings::ToolSettings::default();
        let handle = start(ServerConfig::default(), Arc::new(ToolExecutor::new(&settings)))
            .await
            .unwrap();
        assert_ne!(handle.port(), 0);
        assert!(handle.url().starts_with("http://127.0.0.1:"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn drain_waits_for_finished_tasks() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        let watch = task.abort_handle();
        token.cancel();
        drain(vec![task], Duration::from_secs(5)).await;
        assert!(watch.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_aborts_stuck_tasks() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _held = tx;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        drain(vec![task], Duration::from_millis(50)).await;
        // The sender is only dropped once the aborted task is torn down.
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn start_reports_bind_failure() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ServerConfig {
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };
        let settings = toolchat_settings::ToolSettings::default();
        let err = start(config, Arc::new(ToolExecutor::new(&settings)))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
