use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::common::mutex_lock_or_recover;
use crate::domain::{CommandStatus, ExecutorState, ProcessId, ProcessInfo};
use crate::infra::daemon::capture;
use crate::infra::daemon::config::ServiceConfig;
use crate::infra::daemon::output_buffer::OutputBuffer;
use crate::infra::terminal::PtyHandle;
use crate::usecases::SpawnError;
use crate::usecases::ports::LogSinkHandle;

/// How long finalization waits for the exit status of a dead child.
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

struct Lifecycle {
    state: ExecutorState,
    pid: Option<u32>,
    exit_code: Option<u32>,
    timed_out: bool,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

/// Runs one shell command and owns everything it produces.
///
/// Lock order is `process` before `lifecycle`; the two are never held at the
/// same time.
pub struct CommandExecutor {
    id: ProcessId,
    command: String,
    timeout: Option<Duration>,
    working_dir: PathBuf,
    shell: String,
    poll_interval: Duration,
    interrupt_grace: Duration,
    process: Mutex<Option<PtyHandle>>,
    lifecycle: Mutex<Lifecycle>,
    output: OutputBuffer,
    started: AtomicBool,
    interrupted: AtomicBool,
    capture: Mutex<Option<JoinHandle<()>>>,
    log_sink: LogSinkHandle,
}

impl CommandExecutor {
    pub fn new(
        id: ProcessId,
        command: impl Into<String>,
        timeout: Option<Duration>,
        config: &ServiceConfig,
        log_sink: LogSinkHandle,
    ) -> Self {
        Self {
            id,
            command: command.into(),
            timeout,
            working_dir: config.working_dir.clone(),
            shell: config.shell.clone(),
            poll_interval: config.poll_interval,
            interrupt_grace: config.interrupt_grace,
            process: Mutex::new(None),
            lifecycle: Mutex::new(Lifecycle {
                state: ExecutorState::NotStarted,
                pid: None,
                exit_code: None,
                timed_out: false,
                started_at: None,
                finished_at: None,
            }),
            output: OutputBuffer::new(),
            started: AtomicBool::new(false),
            interrupted: AtomicBool::new(false),
            capture: Mutex::new(None),
            log_sink,
        }
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> ExecutorState {
        mutex_lock_or_recover(&self.lifecycle).state
    }

    /// Spawns the process and its capture loop, then returns immediately.
    pub fn execute(self: &Arc<Self>) -> Result<(), SpawnError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SpawnError::AlreadyStarted);
        }

        let mut handle = PtyHandle::spawn(&self.shell, &self.command, &self.working_dir)
            .map_err(|e| e.into_spawn_error(&self.shell, &self.working_dir))?;
        let reader = handle.take_reader().ok_or_else(|| SpawnError::Pty {
            operation: "read",
            reason: "output stream already taken".to_string(),
        })?;
        let pid = handle.pid();

        *mutex_lock_or_recover(&self.process) = Some(handle);
        {
            let mut lifecycle = mutex_lock_or_recover(&self.lifecycle);
            lifecycle.state = ExecutorState::Running;
            lifecycle.pid = pid;
            lifecycle.started_at = Some(Utc::now());
        }
        self.log_sink
            .log(&format!("Started process {}: {}", self.id, self.command));

        match capture::spawn(Arc::clone(self), reader) {
            Ok(join) => {
                *mutex_lock_or_recover(&self.capture) = Some(join);
                info!(process_id = %self.id, pid = ?pid, command = %self.command, "Command started");
                Ok(())
            }
            Err(e) => {
                self.kill_process();
                self.finalize();
                Err(SpawnError::Pty {
                    operation: "capture",
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Sends Ctrl-C, then kills the process group.
    ///
    /// Only the first call on a running executor does anything; every other
    /// call returns `false`. Waits up to the configured grace period for the
    /// remaining output to drain.
    pub fn interrupt(&self) -> bool {
        if self.state() != ExecutorState::Running {
            return false;
        }
        if self.interrupted.swap(true, Ordering::SeqCst) {
            return false;
        }

        {
            let mut process = mutex_lock_or_recover(&self.process);
            if let Some(handle) = process.as_mut() {
                if let Err(e) = handle.send_interrupt() {
                    debug!(process_id = %self.id, error = %e, "Interrupt delivery failed");
                }
                if let Err(e) = handle.force_terminate() {
                    warn!(process_id = %self.id, error = %e, "Force terminate failed");
                }
            }
        }

        if !self.output.wait_sealed(self.interrupt_grace) {
            debug!(process_id = %self.id, "Capture loop did not drain in time, finalizing");
            self.finalize();
        }
        true
    }

    pub fn is_running(&self) -> bool {
        if self.state() != ExecutorState::Running {
            return false;
        }
        mutex_lock_or_recover(&self.process)
            .as_mut()
            .is_some_and(PtyHandle::is_alive)
    }

    pub fn output(&self) -> String {
        self.output.snapshot()
    }

    pub fn status(&self) -> CommandStatus {
        CommandStatus {
            running: self.is_running(),
            output: self.output(),
        }
    }

    pub fn info(&self) -> ProcessInfo {
        let output_bytes = self.output.len();
        let running = self.is_running();
        let lifecycle = mutex_lock_or_recover(&self.lifecycle);
        ProcessInfo {
            id: self.id.clone(),
            command: self.command.clone(),
            state: lifecycle.state,
            running: running && lifecycle.state == ExecutorState::Running,
            pid: lifecycle.pid,
            exit_code: lifecycle.exit_code,
            timed_out: lifecycle.timed_out,
            started_at: lifecycle.started_at.map(|t| t.to_rfc3339()),
            finished_at: lifecycle.finished_at.map(|t| t.to_rfc3339()),
            output_bytes,
        }
    }

    /// Waits for the capture loop thread to end.
    pub fn join_capture(&self) {
        let join = mutex_lock_or_recover(&self.capture).take();
        if let Some(join) = join {
            if join.join().is_err() {
                warn!(process_id = %self.id, "Capture loop panicked");
            }
        }
    }

    pub(super) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(super) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub(super) fn append_output(&self, chunk: &[u8]) {
        self.output.append(chunk);
    }

    /// True once the child is gone or the handle has been released.
    pub(super) fn has_exited(&self) -> bool {
        mutex_lock_or_recover(&self.process)
            .as_mut()
            .is_none_or(|handle| !handle.is_alive())
    }

    /// Ends a command whose timeout elapsed. It finishes as `Exited`.
    pub(super) fn expire(&self) {
        mutex_lock_or_recover(&self.lifecycle).timed_out = true;
        warn!(process_id = %self.id, timeout = ?self.timeout, "Command timed out, terminating");
        self.kill_process();
    }

    fn kill_process(&self) {
        let mut process = mutex_lock_or_recover(&self.process);
        if let Some(handle) = process.as_mut() {
            if let Err(e) = handle.force_terminate() {
                warn!(process_id = %self.id, error = %e, "Force terminate failed");
            }
        }
    }

    /// Releases the process handle and moves to a terminal state.
    ///
    /// Idempotent: only the caller that takes the handle does the work.
    pub(super) fn finalize(&self) -> bool {
        let Some(mut handle) = mutex_lock_or_recover(&self.process).take() else {
            return false;
        };
        let exit_code = handle.reap(REAP_TIMEOUT);
        drop(handle);

        let interrupted = self.interrupted.load(Ordering::SeqCst);
        let (state, timed_out) = {
            let mut lifecycle = mutex_lock_or_recover(&self.lifecycle);
            self.output.seal();
            lifecycle.state = if interrupted {
                ExecutorState::Interrupted
            } else {
                ExecutorState::Exited
            };
            lifecycle.exit_code = exit_code;
            lifecycle.finished_at = Some(Utc::now());
            (lifecycle.state, lifecycle.timed_out)
        };

        info!(
            process_id = %self.id,
            exit_code = ?exit_code,
            state = %state,
            timed_out,
            "Command finished"
        );
        self.log_sink.log(&self.finish_message(state, exit_code, timed_out));
        true
    }

    fn finish_message(&self, state: ExecutorState, exit_code: Option<u32>, timed_out: bool) -> String {
        match (state, timed_out) {
            (ExecutorState::Interrupted, _) => format!("Process {} interrupted", self.id),
            (_, true) => format!(
                "Process {} timed out after {}s",
                self.id,
                self.timeout.map(|t| t.as_secs()).unwrap_or_default()
            ),
            _ => match exit_code {
                Some(code) => format!("Process {} exited with code {code}", self.id),
                None => format!("Process {} exited", self.id),
            },
        }
    }
}
