//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{ChatSettings, LogFormat};

/// Resolve the default settings file (`~/.toolchat/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".toolchat").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ChatSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ChatSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<ChatSettings> {
    let defaults = serde_json::to_value(ChatSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `TOOLCHAT_*` overrides read through `lookup`.
///
/// Invalid values are logged and ignored, leaving the file/default value.
pub fn apply_env_overrides<F>(settings: &mut ChatSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(v) = env.string("TOOLCHAT_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16_in("TOOLCHAT_PORT", 0, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.u64_in("TOOLCHAT_TIME_INTERVAL_SECS", 1, 3600) {
        settings.push.time_interval_secs = v;
    }
    if let Some(v) = env.u64_in("TOOLCHAT_HEARTBEAT_INTERVAL_SECS", 1, 3600) {
        settings.push.heartbeat_interval_secs = v;
    }
    if let Some(v) = env.u64_in("TOOLCHAT_SYSTEM_INTERVAL_SECS", 1, 3600) {
        settings.push.system_interval_secs = v;
    }
    if let Some(v) = env.u64_in("TOOLCHAT_TOOL_TIMEOUT_MS", 10, 600_000) {
        settings.tools.timeout_ms = v;
    }
    if let Some(v) = env.string("TOOLCHAT_DEFAULT_CITY") {
        settings.tools.default_city = v;
    }
    if let Some(v) = env.string("TOOLCHAT_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.string("TOOLCHAT_LOG_FORMAT") {
        match parse_log_format(&v) {
            Some(format) => settings.logging.format = format,
            None => tracing::warn!(value = %v, "invalid TOOLCHAT_LOG_FORMAT, ignoring"),
        }
    }
}

// ── Pure parsing functions ──────────────────────────────────────────

/// Parse a string as a `u16` within an inclusive range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

pub fn parse_log_format(val: &str) -> Option<LogFormat> {
    match val.trim().to_lowercase().as_str() {
        "compact" | "text" | "pretty" => Some(LogFormat::Compact),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn u16_in(&self, key: &str, min: u16, max: u16) -> Option<u16> {
        let val = (self.lookup)(key)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64_in(&self, key: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(key)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 3001, "host": "localhost"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "localhost");
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_file_layer(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.server.port, 3001);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"push": {"timeIntervalSecs": 2}, "tools": {"defaultCity": "Lisbon"}}"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.push.time_interval_secs, 2);
        assert_eq!(settings.push.heartbeat_interval_secs, 30);
        assert_eq!(settings.tools.default_city, "Lisbon");
        assert_eq!(settings.tools.timeout_ms, 5_000);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_file_layer(&path), Err(SettingsError::Json(_))));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let mut settings = ChatSettings::default();
        apply_env_overrides(
            &mut settings,
            env(&[
                ("TOOLCHAT_HOST", "0.0.0.0"),
                ("TOOLCHAT_PORT", "8088"),
                ("TOOLCHAT_TIME_INTERVAL_SECS", "1"),
                ("TOOLCHAT_DEFAULT_CITY", "Oslo"),
                ("TOOLCHAT_LOG_FORMAT", "json"),
            ]),
        );
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.push.time_interval_secs, 1);
        assert_eq!(settings.tools.default_city, "Oslo");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut settings = ChatSettings::default();
        apply_env_overrides(
            &mut settings,
            env(&[
                ("TOOLCHAT_PORT", "not-a-port"),
                ("TOOLCHAT_TIME_INTERVAL_SECS", "0"),
                ("TOOLCHAT_HOST", "   "),
                ("TOOLCHAT_LOG_FORMAT", "xml"),
            ]),
        );
        assert_eq!(settings.server.port, 3001);
        assert_eq!(settings.push.time_interval_secs, 6);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }

    #[test]
    fn range_parsers() {
        assert_eq!(parse_u16_range("80", 1, 100), Some(80));
        assert_eq!(parse_u16_range("101", 1, 100), None);
        assert_eq!(parse_u64_range(" 30 ", 1, 60), Some(30));
        assert_eq!(parse_u64_range("-1", 1, 60), None);
    }
}
