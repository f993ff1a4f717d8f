use crate::common::error_codes::{self, ErrorCategory};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Failed to bind listener on {addr}: {reason}")]
    Bind { addr: String, reason: String },
    #[error("Failed to build async runtime: {0}")]
    Runtime(String),
    #[error("Failed to setup signal handler: {0}")]
    SignalSetup(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DaemonError {
    pub fn code(&self) -> i32 {
        error_codes::DAEMON_ERROR
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DaemonError::Config(_) => ErrorCategory::InvalidInput,
            _ => ErrorCategory::External,
        }
    }

    pub fn suggestion(&self) -> String {
        match self {
            DaemonError::Bind { .. } => {
                "Check that the address is free or pick another with --listen / CMDEXEC_LISTEN."
                    .to_string()
            }
            DaemonError::Runtime(_) => {
                "Runtime creation failed. Check system thread limits (ulimit -u).".to_string()
            }
            DaemonError::SignalSetup(_) => {
                "Signal handler setup failed. Check system signal configuration.".to_string()
            }
            DaemonError::Config(_) => {
                "Fix the reported setting; run 'cmdexec serve --help' for the options.".to_string()
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DaemonError::Bind { .. })
    }
}
