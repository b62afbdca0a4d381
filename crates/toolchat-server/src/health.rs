//! `/health` endpoint.

use std::time::Instant;

use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// RFC 3339 time the response was produced.
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Open JSON-RPC sessions.
    pub active_sessions: usize,
    /// Connected SSE push clients.
    pub push_clients: usize,
}

/// Build a health response from live counters.
pub fn health_check(start_time: Instant, sessions: usize, push_clients: usize) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        uptime_secs: start_time.elapsed().as_secs(),
        active_sessions: sessions,
        push_clients,
    }
}
