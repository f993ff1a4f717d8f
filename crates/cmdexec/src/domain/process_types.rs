//! Process identifier, lifecycle state and status types.

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessIdError {
    #[error("Process ID cannot be empty or whitespace-only")]
    Empty,
}

/// Opaque token minted once per started command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn try_new(id: impl Into<String>) -> Result<Self, ProcessIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProcessIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used for thread names and log prefixes.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProcessId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    NotStarted,
    Running,
    Exited,
    Interrupted,
}

impl ExecutorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutorState::Exited | ExecutorState::Interrupted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutorState::NotStarted => "not_started",
            ExecutorState::Running => "running",
            ExecutorState::Exited => "exited",
            ExecutorState::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatus {
    pub running: bool,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: ProcessId,
    pub command: String,
    pub state: ExecutorState,
    /// Lifecycle state reconciled with process liveness, same as status polls.
    pub running: bool,
    pub pid: Option<u32>,
    pub exit_code: Option<u32>,
    pub timed_out: bool,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub output_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing command")]
    MissingCommand,
    #[error("Missing process_id")]
    MissingProcessId,
    #[error("Timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(i64),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingCommand => "command",
            ValidationError::MissingProcessId => "process_id",
            ValidationError::InvalidTimeout(_) => "timeout",
        }
    }
}
