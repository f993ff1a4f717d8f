pub mod commands;
pub mod ports;

pub use commands::{
    CommandStatusUseCase, CommandStatusUseCaseImpl, HealthUseCase, HealthUseCaseImpl,
    ListCommandsUseCase, ListCommandsUseCaseImpl, StartCommandUseCase, StartCommandUseCaseImpl,
    StopCommandUseCase, StopCommandUseCaseImpl,
};
pub use ports::{CommandError, SpawnError};
