//! Host and process snapshot.

use std::time::Instant;

use serde::Serialize;
use serde_json::{Value, json};
use sysinfo::{ProcessesToUpdate, System};
use toolchat_core::tools::{SYSTEM_INFO, SystemInfoArgs, ToolResult};

use crate::tool::Tool;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub timestamp: String,
    pub platform: &'static str,
    pub arch: &'static str,
    pub hostname: Option<String>,
    pub os_version: Option<String>,
    pub cpus: usize,
    pub total_memory_bytes: u64,
    pub used_memory_bytes: u64,
    pub process_id: u32,
    pub process_memory_bytes: u64,
    pub process_uptime_secs: u64,
    pub system_uptime_secs: u64,
}

impl SystemSnapshot {
    /// Sample the host. `started_at` marks process start for uptime.
    pub fn capture(started_at: Instant) -> Self {
        let mut system = System::new();
        system.refresh_memory();

        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            hostname: System::host_name(),
            os_version: System::long_os_version(),
            cpus: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            total_memory_bytes: system.total_memory(),
            used_memory_bytes: system.used_memory(),
            process_id: std::process::id(),
            process_memory_bytes: process_memory_bytes(&mut system),
            process_uptime_secs: started_at.elapsed().as_secs(),
            system_uptime_secs: System::uptime(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn process_memory_bytes(system: &mut System) -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    let _ = system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);
    system.process(pid).map_or(0, sysinfo::Process::memory)
}

pub struct SystemInfoTool {
    started_at: Instant,
}

impl SystemInfoTool {
    pub fn new(started_at: Instant) -> Self {
        Self { started_at }
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::capture(self.started_at)
    }
}

impl Tool for SystemInfoTool {
    type Args = SystemInfoArgs;

    fn name(&self) -> &'static str {
        SYSTEM_INFO
    }

    fn description(&self) -> &'static str {
        "Report server platform, memory and uptime"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn run(&self, _args: &SystemInfoArgs) -> ToolResult {
        match serde_json::to_string_pretty(&self.snapshot()) {
            Ok(text) => ToolResult::text(text),
            Err(e) => ToolResult::error(format!("Failed to read system info: {e}")),
        }
    }
}
