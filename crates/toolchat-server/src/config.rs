//! Server configuration.

use std::time::Duration;

use toolchat_settings::ChatSettings;

/// Periods of the push-channel broadcasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushIntervals {
    pub time: Duration,
    pub heartbeat: Duration,
    pub system: Duration,
}

impl Default for PushIntervals {
    fn default() -> Self {
        Self {
            time: Duration::from_secs(6),
            heartbeat: Duration::from_secs(30),
            system: Duration::from_secs(15),
        }
    }
}

/// Configuration for the toolchat server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Outbound event queue capacity per channel.
    pub max_send_queue: usize,
    pub push: PushIntervals,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_send_queue: 256,
            push: PushIntervals::default(),
        }
    }
}

impl ServerConfig {
    /// Build from loaded settings. Zero periods and queue sizes are clamped to 1.
    pub fn from_settings(settings: &ChatSettings) -> Self {
        let secs = |s: u64| Duration::from_secs(s.max(1));
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            max_send_queue: settings.server.max_send_queue.max(1),
            push: PushIntervals {
                time: secs(settings.push.time_interval_secs),
                heartbeat: secs(settings.push.heartbeat_interval_secs),
                system: secs(settings.push.system_interval_secs),
            },
        }
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
