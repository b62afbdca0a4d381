use std::sync::Arc;
use std::time::{Duration, Instant};

use toolchat_core::tools::{ToolCall, ToolDefinition, ToolError, ToolResult};
use toolchat_settings::ToolSettings;
use tracing::{debug, warn};

use crate::calculator::CalculatorTool;
use crate::system::{SystemInfoTool, SystemSnapshot};
use crate::text::TextTransformTool;
use crate::tool::{Tool, ToolContext};
use crate::weather::WeatherTool;

struct Handlers {
    calculator: CalculatorTool,
    weather: WeatherTool,
    text: TextTransformTool,
    system: SystemInfoTool,
}

impl Handlers {
    fn run(&self, call: &ToolCall) -> ToolResult {
        match call {
            ToolCall::Calculator(args) => self.calculator.run(args),
            ToolCall::Weather(args) => self.weather.run(args),
            ToolCall::TextTransform(args) => self.text.run(args),
            ToolCall::SystemInfo(args) => self.system.run(args),
            ToolCall::Unknown { name } => ToolResult::error(format!("Unknown tool: {name}")),
        }
    }
}

/// Runs typed tool calls against the built-in handlers.
///
/// Handlers run on the blocking pool. The timeout and abort signal bound the
/// caller's wait, not the handler itself.
pub struct ToolExecutor {
    handlers: Arc<Handlers>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(settings: &ToolSettings) -> Self {
        Self::with_start(settings, Instant::now())
    }

    /// Like [`new`](Self::new) with an explicit process start for uptime.
    pub fn with_start(settings: &ToolSettings, started_at: Instant) -> Self {
        Self {
            handlers: Arc::new(Handlers {
                calculator: CalculatorTool,
                weather: WeatherTool::new(settings.default_city.clone()),
                text: TextTransformTool,
                system: SystemInfoTool::new(started_at),
            }),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn default_city(&self) -> &str {
        self.handlers.weather.default_city()
    }

    /// Capability listing, in a stable order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let h = &self.handlers;
        vec![
            h.calculator.to_definition(),
            h.weather.to_definition(),
            h.text.to_definition(),
            h.system.to_definition(),
        ]
    }

    pub fn system_snapshot(&self) -> SystemSnapshot {
        self.handlers.system.snapshot()
    }

    /// Sample the host on the blocking pool.
    pub async fn sample_system(&self) -> Result<SystemSnapshot, ToolError> {
        let handlers = Arc::clone(&self.handlers);
        tokio::task::spawn_blocking(move || handlers.system.snapshot())
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }

    /// Run a call synchronously on the current thread. Unknown tools yield
    /// an error result.
    pub fn run(&self, call: &ToolCall) -> ToolResult {
        self.handlers.run(call)
    }

    /// Run a call bounded by the configured timeout and the context's
    /// abort signal.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let handlers = Arc::clone(&self.handlers);
        let owned = call.clone();
        self.bounded(call.name(), ctx, move || handlers.run(&owned)).await
    }

    async fn bounded<F>(&self, tool: &str, ctx: &ToolContext, job: F) -> Result<ToolResult, ToolError>
    where
        F: FnOnce() -> ToolResult + Send + 'static,
    {
        if ctx.abort_signal.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let start = Instant::now();
        // A timed-out job keeps running on the blocking pool; its result is discarded.
        let task = tokio::task::spawn_blocking(job);
        let outcome = tokio::select! {
            biased;
            () = ctx.abort_signal.cancelled() => Err(ToolError::Cancelled),
            res = tokio::time::timeout(self.timeout, task) => match res {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(e)) => Err(ToolError::ExecutionFailed(e.to_string())),
                Err(_) => Err(ToolError::Timeout(self.timeout)),
            },
        };

        match &outcome {
            Ok(result) => debug!(
                tool,
                is_error = result.is_error,
                duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "tool call finished"
            ),
            Err(e) => warn!(tool, error = %e, "tool call aborted"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use toolchat_core::ids::SessionId;

    fn executor() -> ToolExecutor {
        ToolExecutor::new(&ToolSettings::default())
    }

    #[test]
    fn definitions_cover_all_tools() {
        let names: Vec<String> = executor().definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["calculator", "weather", "text_transform", "system_info"]);
    }

    #[test]
    fn unknown_tool_is_error_result() {
        let result = executor().run(&ToolCall::Unknown {
            name: "teleport".into(),
        });
        assert!(result.is_error);
        assert!(result.joined_text().contains("teleport"));
    }

    #[tokio::test]
    async fn execute_runs_typed_call() {
        let call = ToolCall::from_parts("calculator", Some(json!({"operation": "multiply", "a": 6, "b": 7})))
            .unwrap();
        let result = executor().execute(&call, &ToolContext::default()).await.unwrap();
        assert!(result.joined_text().ends_with("= 42"));
    }

    #[tokio::test]
    async fn cancelled_context_fails_fast() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = ToolContext::new(SessionId::new(), token);
        let call = ToolCall::from_parts("system_info", None).unwrap();
        let err = executor().execute(&call, &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::Cancelled));
    }

    #[test]
    fn timeout_comes_from_settings() {
        let settings = ToolSettings {
            timeout_ms: 250,
            ..ToolSettings::default()
        };
        assert_eq!(ToolExecutor::new(&settings).timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn slow_handler_times_out() {
        let settings = ToolSettings {
            timeout_ms: 20,
            ..ToolSettings::default()
        };
        let exec = ToolExecutor::new(&settings);
        let err = exec
            .bounded("slow", &ToolContext::default(), || {
                std::thread::sleep(Duration::from_millis(500));
                ToolResult::text("late")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn abort_interrupts_running_handler() {
        let token = CancellationToken::new();
        let ctx = ToolContext::new(SessionId::new(), token.clone());
        let exec = executor();
        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = exec
            .bounded("slow", &ctx, || {
                std::thread::sleep(Duration::from_millis(500));
                ToolResult::text("late")
            })
            .await
            .unwrap_err();
        cancel.await.unwrap();
        assert!(matches!(err, ToolError::Cancelled));
    }

    #[tokio::test]
    async fn sample_system_reads_off_the_runtime() {
        let snapshot = executor().sample_system().await.unwrap();
        assert_eq!(snapshot.platform, std::env::consts::OS);
    }

    #[test]
    fn weather_uses_configured_default_city() {
        let settings = ToolSettings {
            default_city: "Reykjavik".into(),
            ..ToolSettings::default()
        };
        let result = ToolExecutor::new(&settings).run(&ToolCall::from_parts("weather", None).unwrap());
        assert!(result.joined_text().contains("Reykjavik"));
    }
}
