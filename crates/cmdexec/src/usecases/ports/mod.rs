pub mod errors;
pub mod log_sink;
pub mod process_repository;
pub mod shutdown_notifier;

#[cfg(test)]
pub mod test_support;

pub use errors::{CommandError, SpawnError};
pub use log_sink::{LogSink, LogSinkHandle, NoopLogSink};
pub use process_repository::ProcessRepository;
pub use shutdown_notifier::{ShutdownNotifier, ShutdownNotifierHandle};
