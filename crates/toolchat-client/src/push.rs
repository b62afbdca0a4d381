//! Rendering of push-channel events as transcript text.

use serde_json::Value;
use toolchat_core::events::ServerEvent;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Transcript text for a push event, or `None` for events that are not shown
/// (`connected`, `heartbeat`).
pub fn render(event: &ServerEvent) -> Option<String> {
    match event {
        ServerEvent::Connected(_) | ServerEvent::Heartbeat(_) => None,
        ServerEvent::TimeUpdate(payload) => {
            Some(format!("Server time: {} ({})", payload.time, payload.date))
        }
        ServerEvent::SystemUpdate(snapshot) => Some(render_system(snapshot)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_system(snapshot: &Value) -> String {
    let text = |key: &str| snapshot.get(key).and_then(Value::as_str).unwrap_or("unknown");
    let number = |key: &str| snapshot.get(key).and_then(Value::as_u64).unwrap_or(0);

    let used = number("usedMemoryBytes") as f64 / BYTES_PER_MB;
    let total = number("totalMemoryBytes") as f64 / BYTES_PER_MB;
    format!(
        "System update: {}/{}, {} CPUs, memory {used:.0}/{total:.0} MB, server uptime {}s",
        text("platform"),
        text("arch"),
        number("cpus"),
        number("processUptimeSecs"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use toolchat_core::events::PushPayload;

    #[test]
    fn time_update_shows_time_and_date() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let text = render(&ServerEvent::TimeUpdate(PushPayload::at(at))).unwrap();
        assert_eq!(text, "Server time: 03:04:05 (2026-01-02)");
    }

    #[test]
    fn heartbeat_and_connected_are_hidden() {
        assert!(render(&ServerEvent::heartbeat()).is_none());
        assert!(render(&ServerEvent::connected("sess_1")).is_none());
    }

    #[test]
    fn system_update_summarizes_snapshot() {
        let snapshot = json!({
            "platform": "linux",
            "arch": "x86_64",
            "cpus": 8,
            "usedMemoryBytes": 2_147_483_648_u64,
            "totalMemoryBytes": 8_589_934_592_u64,
            "processUptimeSecs": 42
        });
        let text = render(&ServerEvent::SystemUpdate(snapshot)).unwrap();
        assert_eq!(
            text,
            "System update: linux/x86_64, 8 CPUs, memory 2048/8192 MB, server uptime 42s"
        );
    }

    #[test]
    fn system_update_tolerates_missing_fields() {
        let text = render(&ServerEvent::SystemUpdate(json!({}))).unwrap();
        assert!(text.starts_with("System update: unknown/unknown"));
    }
}
