//! # toolchat-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ChatSettings::default()`]
//! 2. **User file**: `~/.toolchat/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TOOLCHAT_*` overrides (highest priority)
//!
//! The loaded value is handed to the server and tools explicitly; there is no
//! global settings singleton.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ChatSettings, LogFormat, LoggingSettings, PushSettings, ServerSettings, ToolSettings};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_documented_values() {
        let settings = ChatSettings::default();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3001);
        assert_eq!(settings.push.time_interval_secs, 6);
        assert_eq!(settings.push.heartbeat_interval_secs, 30);
        assert_eq!(settings.push.system_interval_secs, 15);
        assert_eq!(settings.tools.timeout_ms, 5_000);
        assert_eq!(settings.tools.default_city, "San Francisco");
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }
}
