use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::{
    CommandStatus, HealthOutput, ListCommandsOutput, ProcessId, StartCommandInput,
    StartCommandOutput, StatusInput, StopCommandInput, StopCommandOutput, ValidationError,
};
use crate::usecases::ports::{CommandError, ProcessRepository};

fn require_process_id(raw: Option<&str>) -> Result<ProcessId, ValidationError> {
    raw.and_then(|id| ProcessId::try_new(id.trim()).ok())
        .ok_or(ValidationError::MissingProcessId)
}

fn validate_timeout(raw: Option<i64>) -> Result<Option<Duration>, ValidationError> {
    match raw {
        None => Ok(None),
        Some(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs.unsigned_abs()))),
        Some(secs) => Err(ValidationError::InvalidTimeout(secs)),
    }
}

pub trait StartCommandUseCase: Send + Sync {
    fn execute(&self, input: StartCommandInput) -> Result<StartCommandOutput, CommandError>;
}

pub struct StartCommandUseCaseImpl<R: ProcessRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: ProcessRepository + ?Sized> StartCommandUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: ProcessRepository + ?Sized> StartCommandUseCase for StartCommandUseCaseImpl<R> {
    #[tracing::instrument(skip(self, input), fields(timeout = ?input.timeout_secs))]
    fn execute(&self, input: StartCommandInput) -> Result<StartCommandOutput, CommandError> {
        let command = input
            .command
            .filter(|c| !c.trim().is_empty())
            .ok_or(ValidationError::MissingCommand)?;
        let timeout = validate_timeout(input.timeout_secs)?;

        let process_id = self.repository.create_process(&command, timeout)?;
        Ok(StartCommandOutput { process_id })
    }
}

pub trait StopCommandUseCase: Send + Sync {
    fn execute(&self, input: StopCommandInput) -> Result<StopCommandOutput, CommandError>;
}

pub struct StopCommandUseCaseImpl<R: ProcessRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: ProcessRepository + ?Sized> StopCommandUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: ProcessRepository + ?Sized> StopCommandUseCase for StopCommandUseCaseImpl<R> {
    #[tracing::instrument(skip(self, input), fields(process_id = ?input.process_id))]
    fn execute(&self, input: StopCommandInput) -> Result<StopCommandOutput, CommandError> {
        let id = require_process_id(input.process_id.as_deref())?;
        let stopped = self.repository.terminate_process(&id);
        Ok(StopCommandOutput { stopped })
    }
}

pub trait CommandStatusUseCase: Send + Sync {
    fn execute(&self, input: StatusInput) -> Result<CommandStatus, CommandError>;
}

pub struct CommandStatusUseCaseImpl<R: ProcessRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: ProcessRepository + ?Sized> CommandStatusUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: ProcessRepository + ?Sized> CommandStatusUseCase for CommandStatusUseCaseImpl<R> {
    fn execute(&self, input: StatusInput) -> Result<CommandStatus, CommandError> {
        let id = require_process_id(input.process_id.as_deref())?;
        self.repository
            .get_status(&id)
            .ok_or_else(|| CommandError::NotFound(id.to_string()))
    }
}

pub trait ListCommandsUseCase: Send + Sync {
    fn execute(&self) -> ListCommandsOutput;
}

pub struct ListCommandsUseCaseImpl<R: ProcessRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: ProcessRepository + ?Sized> ListCommandsUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R: ProcessRepository + ?Sized> ListCommandsUseCase for ListCommandsUseCaseImpl<R> {
    fn execute(&self) -> ListCommandsOutput {
        let mut processes = self.repository.list();
        processes.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        ListCommandsOutput { processes }
    }
}

pub trait HealthUseCase: Send + Sync {
    fn execute(&self) -> HealthOutput;
}

pub struct HealthUseCaseImpl<R: ProcessRepository + ?Sized> {
    repository: Arc<R>,
    started: Instant,
}

impl<R: ProcessRepository + ?Sized> HealthUseCaseImpl<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            started: Instant::now(),
        }
    }
}

impl<R: ProcessRepository + ?Sized> HealthUseCase for HealthUseCaseImpl<R> {
    fn execute(&self) -> HealthOutput {
        HealthOutput {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            uptime_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            processes: self.repository.len(),
            running: self.repository.running_count(),
        }
    }
}
