//! Request and response bodies of the HTTP API.
//!
//! The same types are used by the CLI client to decode responses.

use serde::{Deserialize, Serialize};

use crate::domain::{CommandStatus, HealthOutput, ProcessInfo};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub command: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub timeout: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub process_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopRequest {
    #[serde(default)]
    pub process_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResponse {
    pub stopped: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub process_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub output: String,
}

impl From<CommandStatus> for StatusResponse {
    fn from(status: CommandStatus) -> Self {
        Self {
            running: status.running,
            output: status.output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfoDto {
    pub process_id: String,
    pub command: String,
    pub state: String,
    pub running: bool,
    pub pid: Option<u32>,
    pub exit_code: Option<u32>,
    pub timed_out: bool,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub output_bytes: usize,
}

impl From<ProcessInfo> for ProcessInfoDto {
    fn from(info: ProcessInfo) -> Self {
        Self {
            process_id: info.id.to_string(),
            command: info.command,
            state: info.state.as_str().to_string(),
            running: info.running,
            pid: info.pid,
            exit_code: info.exit_code,
            timed_out: info.timed_out,
            started_at: info.started_at,
            finished_at: info.finished_at,
            output_bytes: info.output_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    pub processes: Vec<ProcessInfoDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_ms: u64,
    pub processes: usize,
    pub running: usize,
}

impl From<HealthOutput> for HealthResponse {
    fn from(output: HealthOutput) -> Self {
        Self {
            status: output.status.to_string(),
            version: output.version.to_string(),
            uptime_ms: output.uptime_ms,
            processes: output.processes,
            running: output.running,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: i32,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
