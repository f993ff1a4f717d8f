//! PTY errors with the operation that failed.

use std::path::Path;

use thiserror::Error;

use crate::usecases::SpawnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFailureKind {
    NotFound,
    PermissionDenied,
    InvalidWorkingDirectory,
    Other,
}

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("Failed to open PTY: {0}")]
    Open(String),
    #[error("Failed to spawn process: {reason}")]
    Spawn {
        kind: SpawnFailureKind,
        reason: String,
    },
    #[error("Failed to write to PTY: {0}")]
    Write(String),
    #[error("Failed to read from PTY: {0}")]
    Read(String),
    #[error("Failed to signal process: {0}")]
    Signal(String),
}

impl PtyError {
    pub fn operation(&self) -> &'static str {
        match self {
            PtyError::Open(_) => "open",
            PtyError::Spawn { .. } => "spawn",
            PtyError::Write(_) => "write",
            PtyError::Read(_) => "read",
            PtyError::Signal(_) => "signal",
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            PtyError::Open(r)
            | PtyError::Write(r)
            | PtyError::Read(r)
            | PtyError::Signal(r)
            | PtyError::Spawn { reason: r, .. } => r,
        }
    }

    /// Maps a failure that happened before the process existed.
    pub fn into_spawn_error(self, shell: &str, working_dir: &Path) -> SpawnError {
        match self {
            PtyError::Spawn {
                kind: SpawnFailureKind::NotFound,
                ..
            } => SpawnError::ShellNotFound {
                shell: shell.to_string(),
            },
            PtyError::Spawn {
                kind: SpawnFailureKind::PermissionDenied,
                ..
            } => SpawnError::PermissionDenied {
                path: shell.to_string(),
            },
            PtyError::Spawn {
                kind: SpawnFailureKind::InvalidWorkingDirectory,
                reason,
            } => SpawnError::InvalidWorkingDirectory {
                path: working_dir.display().to_string(),
                reason,
            },
            other => SpawnError::Pty {
                operation: other.operation(),
                reason: other.reason().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_and_reason() {
        let err = PtyError::Read("input/output error".into());
        assert_eq!(err.operation(), "read");
        assert_eq!(err.reason(), "input/output error");

        let err = PtyError::Spawn {
            kind: SpawnFailureKind::Other,
            reason: "fork failed".into(),
        };
        assert_eq!(err.operation(), "spawn");
        assert_eq!(err.reason(), "fork failed");
    }

    #[test]
    fn test_into_spawn_error_classifies_kind() {
        let dir = Path::new("/srv/sandbox");

        let not_found = PtyError::Spawn {
            kind: SpawnFailureKind::NotFound,
            reason: "No such file or directory".into(),
        }
        .into_spawn_error("/bin/zsh", dir);
        assert_eq!(
            not_found,
            SpawnError::ShellNotFound {
                shell: "/bin/zsh".into()
            }
        );

        let bad_dir = PtyError::Spawn {
            kind: SpawnFailureKind::InvalidWorkingDirectory,
            reason: "not a directory".into(),
        }
        .into_spawn_error("/bin/sh", dir);
        assert!(matches!(
            bad_dir,
            SpawnError::InvalidWorkingDirectory { ref path, .. } if path == "/srv/sandbox"
        ));

        let open = PtyError::Open("out of ptys".into()).into_spawn_error("/bin/sh", dir);
        assert_eq!(
            open,
            SpawnError::Pty {
                operation: "open",
                reason: "out of ptys".into()
            }
        );
    }
}
