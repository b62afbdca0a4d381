//! Simulated weather. Values are random on every call; nothing is looked up.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use serde_json::{Value, json};
use toolchat_core::tools::{ToolResult, WEATHER, WeatherArgs};

use crate::tool::Tool;

/// Every condition the simulator can report.
pub const CONDITIONS: [&str; 8] = [
    "Sunny",
    "Partly Cloudy",
    "Cloudy",
    "Rainy",
    "Stormy",
    "Snowy",
    "Foggy",
    "Windy",
];

/// Inclusive temperature range in °C.
pub const TEMPERATURE_RANGE_C: (i32, i32) = (-5, 35);

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub city: String,
    pub temperature_c: i32,
    pub condition: &'static str,
    pub humidity_pct: u8,
    pub wind_kph: u8,
}

impl WeatherReport {
    pub fn generate<R: Rng + ?Sized>(city: impl Into<String>, rng: &mut R) -> Self {
        let (lo, hi) = TEMPERATURE_RANGE_C;
        Self {
            city: city.into(),
            temperature_c: rng.random_range(lo..=hi),
            condition: CONDITIONS.choose(rng).copied().unwrap_or(CONDITIONS[0]),
            humidity_pct: rng.random_range(20..=95),
            wind_kph: rng.random_range(0..=40),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Weather in {}: {}°C, {}. Humidity {}%, wind {} km/h.",
            self.city, self.temperature_c, self.condition, self.humidity_pct, self.wind_kph
        )
    }
}

pub struct WeatherTool {
    default_city: String,
}

impl WeatherTool {
    pub fn new(default_city: impl Into<String>) -> Self {
        Self {
            default_city: default_city.into(),
        }
    }

    /// Requested city, or the default when absent or blank.
    pub fn resolve_city<'a>(&'a self, args: &'a WeatherArgs) -> &'a str {
        args.city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.default_city)
    }

    pub fn default_city(&self) -> &str {
        &self.default_city
    }
}

impl Tool for WeatherTool {
    type Args = WeatherArgs;

    fn name(&self) -> &'static str {
        WEATHER
    }

    fn description(&self) -> &'static str {
        "Get the current (simulated) weather for a city"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": format!("City name (defaults to {})", self.default_city)
                }
            }
        })
    }

    fn run(&self, args: &WeatherArgs) -> ToolResult {
        let report = WeatherReport::generate(self.resolve_city(args), &mut rand::rng());
        ToolResult::text(report.render())
    }
}
