//! Read-only resources exposed through `resources/list` and `resources/read`.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::executor::ToolExecutor;
use crate::weather::CONDITIONS;

pub const SYSTEM_INFO_URI: &str = "system://info";
pub const WEATHER_CONDITIONS_URI: &str = "weather://conditions";
pub const HELP_URI: &str = "docs://help";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// Current contents of a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown resource: {0}")]
pub struct UnknownResource(pub String);

/// Capability help shown by `docs://help` and the `help` intent.
pub const HELP_TEXT: &str = "\
I can help with a few things:
- **Calculator**: \"calculate 15 + 27\" or \"what is 6 * 7\"
- **Weather**: \"weather in Paris\" or \"what's the weather like\"
- **Text**: \"uppercase hello\", \"reverse hello\", \"capitalize hello world\", \"word count some text\"
- **System**: \"system info\" or \"server status\"
Type \"help\" at any time to see this list again.";

pub fn list() -> Vec<ResourceDefinition> {
    vec![
        definition(SYSTEM_INFO_URI, "System information", "Live server platform, memory and uptime", "application/json"),
        definition(
            WEATHER_CONDITIONS_URI,
            "Weather conditions",
            "Conditions the weather simulator can report and the default city",
            "application/json",
        ),
        definition(HELP_URI, "Help", "What the assistant can do", "text/markdown"),
    ]
}

fn definition(uri: &str, name: &str, description: &str, mime_type: &str) -> ResourceDefinition {
    ResourceDefinition {
        uri: uri.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        mime_type: mime_type.to_string(),
    }
}

/// Read the current snapshot of `uri`.
pub fn read(uri: &str, tools: &ToolExecutor) -> Result<ResourceContents, UnknownResource> {
    let (mime_type, text) = match uri {
        SYSTEM_INFO_URI => ("application/json", pretty(&tools.system_snapshot().to_value())),
        WEATHER_CONDITIONS_URI => (
            "application/json",
            pretty(&json!({
                "conditions": CONDITIONS,
                "defaultCity": tools.default_city(),
            })),
        ),
        HELP_URI => ("text/markdown", HELP_TEXT.to_string()),
        other => return Err(UnknownResource(other.to_string())),
    };
    Ok(ResourceContents {
        uri: uri.to_string(),
        mime_type: mime_type.to_string(),
        text,
    })
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
