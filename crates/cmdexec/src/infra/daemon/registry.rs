use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::common::{rwlock_read_or_recover, rwlock_write_or_recover};
use crate::domain::{CommandStatus, ProcessId, ProcessInfo};
use crate::infra::daemon::config::ServiceConfig;
use crate::infra::daemon::executor::CommandExecutor;
use crate::usecases::SpawnError;
use crate::usecases::ports::{LogSinkHandle, ProcessRepository};

/// Every command started by the service, keyed by process id.
///
/// Entries are kept for the life of the registry so the final output of a
/// finished command stays queryable. The map lock only covers inserts and
/// lookups, never process I/O.
pub struct ProcessRegistry {
    processes: RwLock<HashMap<ProcessId, Arc<CommandExecutor>>>,
    config: ServiceConfig,
    log_sink: LogSinkHandle,
}

impl ProcessRegistry {
    pub fn new(config: ServiceConfig, log_sink: LogSinkHandle) -> Self {
        Self {
            processes: RwLock::new(HashMap::new()),
            config,
            log_sink,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn create_process(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ProcessId, SpawnError> {
        let id = self.mint_id();
        let executor = Arc::new(CommandExecutor::new(
            id.clone(),
            command,
            timeout,
            &self.config,
            Arc::clone(&self.log_sink),
        ));
        executor.execute()?;

        rwlock_write_or_recover(&self.processes).insert(id.clone(), executor);

        info!(process_id = %id, command, "Process registered");
        Ok(id)
    }

    pub fn terminate_process(&self, id: &ProcessId) -> bool {
        let Some(executor) = self.get(id) else {
            return false;
        };
        if executor.interrupt() {
            info!(process_id = %id, "Process interrupted");
        }
        true
    }

    pub fn get_status(&self, id: &ProcessId) -> Option<CommandStatus> {
        self.get(id).map(|executor| executor.status())
    }

    pub fn get(&self, id: &ProcessId) -> Option<Arc<CommandExecutor>> {
        rwlock_read_or_recover(&self.processes).get(id).cloned()
    }

    pub fn list(&self) -> Vec<ProcessInfo> {
        self.snapshot().iter().map(|e| e.info()).collect()
    }

    pub fn len(&self) -> usize {
        rwlock_read_or_recover(&self.processes).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn running_count(&self) -> usize {
        self.snapshot().iter().filter(|e| e.is_running()).count()
    }

    /// Interrupts whatever is still running and joins every capture loop.
    pub fn shutdown(&self) {
        let executors = self.snapshot();
        let interrupted = executors.iter().filter(|e| e.interrupt()).count();
        for executor in &executors {
            executor.join_capture();
        }
        info!(
            processes = executors.len(),
            interrupted, "Process registry shut down"
        );
    }

    fn snapshot(&self) -> Vec<Arc<CommandExecutor>> {
        rwlock_read_or_recover(&self.processes)
            .values()
            .cloned()
            .collect()
    }

    fn mint_id(&self) -> ProcessId {
        let processes = rwlock_read_or_recover(&self.processes);
        loop {
            let id = ProcessId::from_uuid(Uuid::new_v4());
            if !processes.contains_key(&id) {
                return id;
            }
        }
    }
}

impl ProcessRepository for ProcessRegistry {
    fn create_process(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ProcessId, SpawnError> {
        ProcessRegistry::create_process(self, command, timeout)
    }

    fn terminate_process(&self, id: &ProcessId) -> bool {
        ProcessRegistry::terminate_process(self, id)
    }

    fn get_status(&self, id: &ProcessId) -> Option<CommandStatus> {
        ProcessRegistry::get_status(self, id)
    }

    fn list(&self) -> Vec<ProcessInfo> {
        ProcessRegistry::list(self)
    }

    fn len(&self) -> usize {
        ProcessRegistry::len(self)
    }

    fn running_count(&self) -> usize {
        ProcessRegistry::running_count(self)
    }
}
