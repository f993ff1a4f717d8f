use std::sync::Arc;

/// Destination for activity messages about started and finished commands.
///
/// Implementations must not block and must swallow their own failures.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

pub type LogSinkHandle = Arc<dyn LogSink>;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    fn log(&self, _message: &str) {}
}
