#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod adapters;
mod app;
mod common;
mod domain;
mod infra;
mod usecases;

pub use adapters::CommandController;
pub use adapters::dto;
pub use app::Application;
pub use app::daemon::build_router;
pub use domain::CommandStatus;
pub use domain::ExecutorState;
pub use domain::ProcessId;
pub use infra::daemon::CommandExecutor;
pub use infra::daemon::ProcessRegistry;
pub use infra::daemon::ServiceConfig;
pub use usecases::SpawnError;
pub use usecases::ports::LogSink;
pub use usecases::ports::LogSinkHandle;
pub use usecases::ports::NoopLogSink;
pub use usecases::ports::ProcessRepository;
