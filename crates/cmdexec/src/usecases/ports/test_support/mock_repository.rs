//! Configurable in-memory `ProcessRepository` for use case tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::{CommandStatus, ExecutorState, ProcessId, ProcessInfo};
use crate::usecases::ports::{ProcessRepository, SpawnError};

#[derive(Default)]
pub struct MockProcessRepository {
    spawn_error: Option<SpawnError>,
    statuses: HashMap<String, CommandStatus>,
    next_id: Option<ProcessId>,
    created: Mutex<Vec<(String, Option<Duration>)>>,
    create_calls: AtomicUsize,
    terminate_calls: AtomicUsize,
}

impl MockProcessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MockProcessRepositoryBuilder {
        MockProcessRepositoryBuilder::default()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<(String, Option<Duration>)> {
        self.created.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct MockProcessRepositoryBuilder {
    repo: MockProcessRepository,
}

impl MockProcessRepositoryBuilder {
    pub fn with_spawn_error(mut self, error: SpawnError) -> Self {
        self.repo.spawn_error = Some(error);
        self
    }

    pub fn with_next_id(mut self, id: &str) -> Self {
        self.repo.next_id = Some(ProcessId::try_new(id).unwrap());
        self
    }

    pub fn with_status(mut self, id: &str, running: bool, output: &str) -> Self {
        self.repo.statuses.insert(
            id.to_string(),
            CommandStatus {
                running,
                output: output.to_string(),
            },
        );
        self
    }

    pub fn build(self) -> MockProcessRepository {
        self.repo
    }
}

impl ProcessRepository for MockProcessRepository {
    fn create_process(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ProcessId, SpawnError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.spawn_error {
            return Err(err.clone());
        }
        self.created
            .lock()
            .unwrap()
            .push((command.to_string(), timeout));
        Ok(self
            .next_id
            .clone()
            .unwrap_or_else(|| ProcessId::try_new("mock-process").unwrap()))
    }

    fn terminate_process(&self, id: &ProcessId) -> bool {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses.contains_key(id.as_str())
    }

    fn get_status(&self, id: &ProcessId) -> Option<CommandStatus> {
        self.statuses.get(id.as_str()).cloned()
    }

    fn list(&self) -> Vec<ProcessInfo> {
        self.statuses
            .iter()
            .map(|(id, status)| ProcessInfo {
                id: ProcessId::try_new(id.as_str()).unwrap(),
                command: "mock".to_string(),
                state: if status.running {
                    ExecutorState::Running
                } else {
                    ExecutorState::Exited
                },
                running: status.running,
                pid: None,
                exit_code: None,
                timed_out: false,
                started_at: None,
                finished_at: None,
                output_bytes: status.output.len(),
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.statuses.len()
    }

    fn running_count(&self) -> usize {
        self.statuses.values().filter(|s| s.running).count()
    }
}
