use std::sync::Arc;

use crate::adapters::dto::{
    ErrorBody, HealthResponse, ListResponse, StartRequest, StartResponse, StatusQuery,
    StatusResponse, StopRequest, StopResponse,
};
use crate::common::error_codes::{self, ErrorCategory};
use crate::domain::{StartCommandInput, StatusInput, StopCommandInput};
use crate::usecases::ports::ProcessRepository;
use crate::usecases::{
    CommandError, CommandStatusUseCase, CommandStatusUseCaseImpl, HealthUseCase,
    HealthUseCaseImpl, ListCommandsUseCase, ListCommandsUseCaseImpl, StartCommandUseCase,
    StartCommandUseCaseImpl, StopCommandUseCase, StopCommandUseCaseImpl,
};

/// An error already shaped for the wire: HTTP status plus JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub body: ErrorBody,
}

impl ApiError {
    /// Request bodies or query strings that could not be decoded.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: ErrorBody {
                error: reason.into(),
                code: error_codes::INVALID_INPUT,
                category: ErrorCategory::InvalidInput.as_str().to_string(),
                suggestion: None,
            },
        }
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        let status = match &err {
            CommandError::Validation(_) => 400,
            CommandError::NotFound(_) => 404,
            CommandError::Spawn(_) => 500,
        };
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                code: err.code(),
                category: err.category().as_str().to_string(),
                suggestion: err.suggestion(),
            },
        }
    }
}

/// Entry point for the HTTP handlers. Holds no state of its own.
pub struct CommandController {
    start: Arc<dyn StartCommandUseCase>,
    stop: Arc<dyn StopCommandUseCase>,
    status: Arc<dyn CommandStatusUseCase>,
    list: Arc<dyn ListCommandsUseCase>,
    health: Arc<dyn HealthUseCase>,
}

impl CommandController {
    pub fn new(repository: Arc<dyn ProcessRepository>) -> Self {
        Self {
            start: Arc::new(StartCommandUseCaseImpl::new(Arc::clone(&repository))),
            stop: Arc::new(StopCommandUseCaseImpl::new(Arc::clone(&repository))),
            status: Arc::new(CommandStatusUseCaseImpl::new(Arc::clone(&repository))),
            list: Arc::new(ListCommandsUseCaseImpl::new(Arc::clone(&repository))),
            health: Arc::new(HealthUseCaseImpl::new(repository)),
        }
    }

    pub fn start(&self, request: StartRequest) -> Result<StartResponse, ApiError> {
        let output = self.start.execute(StartCommandInput {
            command: request.command,
            timeout_secs: request.timeout,
        })?;
        Ok(StartResponse {
            process_id: output.process_id.to_string(),
        })
    }

    pub fn stop(&self, request: StopRequest) -> Result<StopResponse, ApiError> {
        let output = self.stop.execute(StopCommandInput {
            process_id: request.process_id,
        })?;
        Ok(StopResponse {
            stopped: output.stopped,
        })
    }

    pub fn status(&self, query: StatusQuery) -> Result<StatusResponse, ApiError> {
        let status = self.status.execute(StatusInput {
            process_id: query.process_id,
        })?;
        Ok(status.into())
    }

    pub fn list(&self) -> ListResponse {
        ListResponse {
            processes: self
                .list
                .execute()
                .processes
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    pub fn health(&self) -> HealthResponse {
        self.health.execute().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::SpawnError;
    use crate::usecases::ports::test_support::MockProcessRepository;

    fn controller(repo: MockProcessRepository) -> CommandController {
        CommandController::new(Arc::new(repo))
    }

    #[test]
    fn test_start_returns_process_id() {
        let ctl = controller(MockProcessRepository::builder().with_next_id("p-1").build());
        let response = ctl
            .start(StartRequest {
                command: Some("echo hello".into()),
                timeout: None,
            })
            .unwrap();
        assert_eq!(response.process_id, "p-1");
    }

    #[test]
    fn test_validation_maps_to_400() {
        let ctl = controller(MockProcessRepository::new());

        let err = ctl.start(StartRequest::default()).unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.body.code, error_codes::INVALID_INPUT);
        assert_eq!(err.body.category, "invalid_input");

        let err = ctl
            .start(StartRequest {
                command: Some("ls".into()),
                timeout: Some(0),
            })
            .unwrap_err();
        assert_eq!(err.status, 400);

        assert_eq!(ctl.stop(StopRequest::default()).unwrap_err().status, 400);
        assert_eq!(ctl.status(StatusQuery::default()).unwrap_err().status, 400);
    }

    #[test]
    fn test_unknown_status_maps_to_404() {
        let ctl = controller(MockProcessRepository::new());
        let err = ctl
            .status(StatusQuery {
                process_id: Some("missing".into()),
            })
            .unwrap_err();
        assert_eq!(err.status, 404);
        assert_eq!(err.body.code, error_codes::PROCESS_NOT_FOUND);
        assert_eq!(err.body.category, "not_found");
    }

    #[test]
    fn test_spawn_failure_maps_to_500() {
        let ctl = controller(
            MockProcessRepository::builder()
                .with_spawn_error(SpawnError::PermissionDenied {
                    path: "/bin/sh".into(),
                })
                .build(),
        );
        let err = ctl
            .start(StartRequest {
                command: Some("ls".into()),
                timeout: None,
            })
            .unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(err.body.code, error_codes::PERMISSION_DENIED);
        assert!(err.body.suggestion.is_some());
    }

    #[test]
    fn test_stop_unknown_is_not_an_error() {
        let ctl = controller(MockProcessRepository::new());
        let response = ctl
            .stop(StopRequest {
                process_id: Some("ghost".into()),
            })
            .unwrap();
        assert!(!response.stopped);
    }

    #[test]
    fn test_status_and_list_shapes() {
        let ctl = controller(
            MockProcessRepository::builder()
                .with_status("p-2", true, "partial")
                .build(),
        );
        let status = ctl
            .status(StatusQuery {
                process_id: Some("p-2".into()),
            })
            .unwrap();
        assert_eq!(
            status,
            StatusResponse {
                running: true,
                output: "partial".into()
            }
        );

        let list = ctl.list();
        assert_eq!(list.processes.len(), 1);
        assert_eq!(list.processes[0].process_id, "p-2");
        assert_eq!(list.processes[0].state, "running");

        let health = ctl.health();
        assert_eq!(health.processes, 1);
        assert_eq!(health.running, 1);
    }
}
