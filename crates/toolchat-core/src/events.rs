//! Push-channel events.
//!
//! Every event has a wire name (the SSE `event:` field) and a JSON payload
//! (the SSE `data:` field). The serde representation is
//! `{ "event": <name>, "data": <payload> }`, which lets a client rebuild the
//! typed event from the two SSE fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timestamp payload regenerated on every `time-update` tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    /// RFC 3339 timestamp with millisecond precision.
    pub timestamp: String,
    /// Clock time, `HH:MM:SS`.
    pub time: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
}

impl PushPayload {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            time: now.format("%H:%M:%S").to_string(),
            date: now.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    /// Registry id of the push channel; used for `DELETE /events/{id}`.
    pub client_id: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub timestamp: String,
}

/// A server-initiated event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Connected(ConnectedPayload),
    Heartbeat(HeartbeatPayload),
    TimeUpdate(PushPayload),
    /// Periodic system snapshot; payload is the system info document.
    SystemUpdate(Value),
}

impl ServerEvent {
    pub fn connected(client_id: impl Into<String>) -> Self {
        Self::Connected(ConnectedPayload {
            client_id: client_id.into(),
            timestamp: rfc3339_now(),
        })
    }

    pub fn heartbeat() -> Self {
        Self::Heartbeat(HeartbeatPayload {
            timestamp: rfc3339_now(),
        })
    }

    pub fn time_update() -> Self {
        Self::TimeUpdate(PushPayload::now())
    }

    /// SSE `event:` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Heartbeat(_) => "heartbeat",
            Self::TimeUpdate(_) => "time-update",
            Self::SystemUpdate(_) => "system-update",
        }
    }

    /// SSE `data:` payload.
    pub fn data(&self) -> Value {
        let value = match self {
            Self::Connected(p) => serde_json::to_value(p),
            Self::Heartbeat(p) => serde_json::to_value(p),
            Self::TimeUpdate(p) => serde_json::to_value(p),
            Self::SystemUpdate(v) => Ok(v.clone()),
        };
        value.unwrap_or(Value::Null)
    }

    /// Rebuild an event from its SSE name and data. Unknown names yield `None`.
    pub fn from_sse(name: &str, data: &str) -> Option<Self> {
        let data: Value = serde_json::from_str(data).ok()?;
        serde_json::from_value(serde_json::json!({ "event": name, "data": data })).ok()
    }
}

fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
