use std::time::Duration;

use crate::domain::{CommandStatus, ProcessId, ProcessInfo};

use super::SpawnError;

/// Storage and lifecycle control for started commands.
pub trait ProcessRepository: Send + Sync {
    /// Spawns `command` and registers it under a fresh id.
    ///
    /// Returns as soon as the process exists; output capture continues in
    /// the background. Nothing is registered when spawning fails.
    fn create_process(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ProcessId, SpawnError>;

    /// Interrupts the process. `false` when the id is unknown.
    fn terminate_process(&self, id: &ProcessId) -> bool;

    fn get_status(&self, id: &ProcessId) -> Option<CommandStatus>;

    fn list(&self) -> Vec<ProcessInfo>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn running_count(&self) -> usize;
}
