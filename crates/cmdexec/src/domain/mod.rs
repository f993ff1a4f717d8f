pub mod process_types;
pub mod types;

pub use process_types::{
    CommandStatus, ExecutorState, ProcessId, ProcessIdError, ProcessInfo, ValidationError,
};
pub use types::{
    HealthOutput, ListCommandsOutput, StartCommandInput, StartCommandOutput, StatusInput,
    StopCommandInput, StopCommandOutput,
};
