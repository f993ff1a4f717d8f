//! Use case inputs and outputs.

use crate::domain::process_types::{ProcessId, ProcessInfo};

#[derive(Debug, Clone, Default)]
pub struct StartCommandInput {
    pub command: Option<String>,
    pub timeout_secs: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCommandOutput {
    pub process_id: ProcessId,
}

#[derive(Debug, Clone, Default)]
pub struct StopCommandInput {
    pub process_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopCommandOutput {
    pub stopped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StatusInput {
    pub process_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListCommandsOutput {
    pub processes: Vec<ProcessInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthOutput {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_ms: u64,
    pub processes: usize,
    pub running: usize,
}
