//! Errors surfaced by the command use cases.

use thiserror::Error;

use crate::common::error_codes::{self, ErrorCategory};
use crate::domain::ValidationError;

/// The shell could not be started. Nothing is registered when this occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("Shell not found: {shell}")]
    ShellNotFound { shell: String },
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },
    #[error("Invalid working directory {path}: {reason}")]
    InvalidWorkingDirectory { path: String, reason: String },
    #[error("PTY {operation} failed: {reason}")]
    Pty {
        operation: &'static str,
        reason: String,
    },
    #[error("Command already started")]
    AlreadyStarted,
}

impl SpawnError {
    pub fn code(&self) -> i32 {
        match self {
            SpawnError::ShellNotFound { .. } => error_codes::COMMAND_NOT_FOUND,
            SpawnError::PermissionDenied { .. } => error_codes::PERMISSION_DENIED,
            SpawnError::InvalidWorkingDirectory { .. }
            | SpawnError::Pty { .. }
            | SpawnError::AlreadyStarted => error_codes::SPAWN_FAILED,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SpawnError::AlreadyStarted => ErrorCategory::Internal,
            _ => ErrorCategory::External,
        }
    }

    pub fn suggestion(&self) -> String {
        match self {
            SpawnError::ShellNotFound { shell } => {
                format!("Shell '{shell}' does not exist. Set CMDEXEC_SHELL to an installed shell.")
            }
            SpawnError::PermissionDenied { path } => {
                format!("Check that '{path}' is executable by the service user.")
            }
            SpawnError::InvalidWorkingDirectory { path, .. } => {
                format!("Set CMDEXEC_WORKDIR to an existing directory (currently '{path}').")
            }
            SpawnError::Pty { .. } => {
                "PTY allocation failed. Check system resource limits (ulimit -n).".to_string()
            }
            SpawnError::AlreadyStarted => "Start a new command instead.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Process not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

impl CommandError {
    pub fn code(&self) -> i32 {
        match self {
            CommandError::Validation(_) => error_codes::INVALID_INPUT,
            CommandError::NotFound(_) => error_codes::PROCESS_NOT_FOUND,
            CommandError::Spawn(e) => e.code(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CommandError::Validation(_) => ErrorCategory::InvalidInput,
            CommandError::NotFound(_) => ErrorCategory::NotFound,
            CommandError::Spawn(e) => e.category(),
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            CommandError::Validation(e) => Some(format!("Provide a valid '{}' field.", e.field())),
            CommandError::NotFound(_) => {
                Some("Run 'cmdexec list' to see known process ids.".to_string())
            }
            CommandError::Spawn(e) => Some(e.suggestion()),
        }
    }
}
