//! Settings types. Every struct uses `#[serde(default)]` so a partial
//! settings file only needs the keys it changes.

use serde::{Deserialize, Serialize};

/// Root settings document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    pub server: ServerSettings,
    pub push: PushSettings,
    pub tools: ToolSettings,
    pub logging: LoggingSettings,
}

/// HTTP listener and per-connection limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Outbound event queue capacity per channel.
    pub max_send_queue: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_send_queue: 256,
        }
    }
}

/// Push-channel broadcast periods.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushSettings {
    /// Period of `time-update` events.
    pub time_interval_secs: u64,
    /// Period of `heartbeat` keep-alive events.
    pub heartbeat_interval_secs: u64,
    /// Period of `system-update` events.
    pub system_interval_secs: u64,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            time_interval_secs: 6,
            heartbeat_interval_secs: 30,
            system_interval_secs: 15,
        }
    }
}

/// Tool execution settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSettings {
    /// Upper bound on a single tool call.
    pub timeout_ms: u64,
    /// City used when a weather request names none.
    pub default_city: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            default_city: "San Francisco".to_string(),
        }
    }
}

/// Output format of the stderr log layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
