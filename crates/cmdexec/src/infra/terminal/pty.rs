use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use portable_pty::Child;
use portable_pty::CommandBuilder;
use portable_pty::MasterPty;
use portable_pty::PtySize;
use portable_pty::native_pty_system;
use tracing::debug;

pub use crate::infra::terminal::error::{PtyError, SpawnFailureKind};

const INTERRUPT_BYTE: u8 = 0x03;
const READ_BUFFER_SIZE: usize = 8192;
const READ_CHANNEL_CAPACITY: usize = 64;
const REAP_POLL: Duration = Duration::from_millis(10);

/// A shell process attached to the slave side of a pseudo-terminal.
///
/// The master side stays with the handle. Dropping a handle whose child is
/// still alive kills the child's process group.
pub struct PtyHandle {
    _master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    reader: Option<PtyReader>,
    pid: Option<u32>,
    exit_code: Option<u32>,
}

impl Drop for PtyHandle {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.force_terminate();
        }
    }
}

impl PtyHandle {
    /// Runs `<shell> -c <command>` in `working_dir`.
    pub fn spawn(shell: &str, command: &str, working_dir: &Path) -> Result<Self, PtyError> {
        if !working_dir.is_dir() {
            return Err(PtyError::Spawn {
                kind: SpawnFailureKind::InvalidWorkingDirectory,
                reason: format!("{} is not a directory", working_dir.display()),
            });
        }
        let shell_path = Path::new(shell);
        if shell_path.is_absolute() && !shell_path.exists() {
            return Err(PtyError::Spawn {
                kind: SpawnFailureKind::NotFound,
                reason: format!("{shell} does not exist"),
            });
        }

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Open(e.to_string()))?;

        let mut cmd = CommandBuilder::new(shell);
        cmd.arg("-c");
        cmd.arg(command);
        cmd.cwd(working_dir);
        cmd.env("TERM", "xterm-256color");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(classify_spawn_error)?;
        // The parent must not hold the slave open or EOF never arrives.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Open(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::Open(e.to_string()))?;

        let pid = child.process_id();
        let reader = PtyReader::start(reader)?;

        Ok(Self {
            _master: pair.master,
            child,
            writer,
            reader: Some(reader),
            pid,
            exit_code: None,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Hands the output stream to its consumer. Only the first call returns it.
    pub fn take_reader(&mut self) -> Option<PtyReader> {
        self.reader.take()
    }

    pub fn is_alive(&mut self) -> bool {
        if self.exit_code.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.exit_code = Some(status.exit_code());
                false
            }
            Err(_) => false,
        }
    }

    pub fn exit_code(&mut self) -> Option<u32> {
        if self.exit_code.is_none() {
            self.is_alive();
        }
        self.exit_code
    }

    /// Polls for the exit status for at most `timeout`.
    pub fn reap(&mut self, timeout: Duration) -> Option<u32> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_alive() {
                return self.exit_code;
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(REAP_POLL);
        }
    }

    /// Types Ctrl-C into the terminal so the line discipline signals the
    /// foreground process group.
    pub fn send_interrupt(&mut self) -> Result<(), PtyError> {
        let written = self
            .writer
            .write_all(&[INTERRUPT_BYTE])
            .and_then(|()| self.writer.flush());
        match written {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(error = %e, "Ctrl-C write failed, signalling process group");
                self.signal_group(SignalKind::Interrupt)
            }
        }
    }

    /// Kills the whole process group, then the child itself.
    pub fn force_terminate(&mut self) -> Result<(), PtyError> {
        // Once reaped the pid may belong to someone else.
        if !self.is_alive() {
            return Ok(());
        }
        if let Err(e) = self.signal_group(SignalKind::Kill) {
            debug!(error = %e, "Process group kill failed");
        }
        if !self.is_alive() {
            return Ok(());
        }
        match self.child.kill() {
            Ok(()) => Ok(()),
            Err(_) if !self.is_alive() => Ok(()),
            Err(e) => Err(PtyError::Signal(e.to_string())),
        }
    }

    #[cfg(unix)]
    fn signal_group(&self, kind: SignalKind) -> Result<(), PtyError> {
        if self.exit_code.is_some() {
            return Ok(());
        }
        let Some(pid) = self.pid.and_then(|p| i32::try_from(p).ok()) else {
            return Err(PtyError::Signal("process id unavailable".to_string()));
        };
        let signal = match kind {
            SignalKind::Interrupt => libc::SIGINT,
            SignalKind::Kill => libc::SIGKILL,
        };
        // The child is a session leader, so its pid is also its process group id.
        let result = unsafe { libc::kill(-pid, signal) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                return Ok(());
            }
            return Err(PtyError::Signal(err.to_string()));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn signal_group(&self, _kind: SignalKind) -> Result<(), PtyError> {
        Err(PtyError::Signal(
            "process group signals are not supported on this platform".to_string(),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
enum SignalKind {
    Interrupt,
    Kill,
}

fn classify_spawn_error(err: anyhow::Error) -> PtyError {
    let reason = err.to_string();
    let kind = match err.downcast_ref::<io::Error>().map(io::Error::kind) {
        Some(io::ErrorKind::NotFound) => SpawnFailureKind::NotFound,
        Some(io::ErrorKind::PermissionDenied) => SpawnFailureKind::PermissionDenied,
        _ if reason.contains("doesn't exist") || reason.contains("No such file") => {
            SpawnFailureKind::NotFound
        }
        _ if reason.contains("Permission denied") => SpawnFailureKind::PermissionDenied,
        _ => SpawnFailureKind::Other,
    };
    PtyError::Spawn { kind, reason }
}

/// What one call to [`PtyReader::read_available`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadChunk {
    Data(Vec<u8>),
    /// Nothing arrived within the timeout. The stream is still open.
    Pending,
    Eof,
}

enum ReadEvent {
    Data(Vec<u8>),
    Eof,
    Error(String),
}

/// Output side of a [`PtyHandle`].
///
/// A `pty-reader` thread does the blocking reads and forwards chunks over a
/// bounded channel, so callers can wait with a timeout.
pub struct PtyReader {
    rx: Receiver<ReadEvent>,
    finished: bool,
}

impl PtyReader {
    fn start(mut source: Box<dyn Read + Send>) -> Result<Self, PtyError> {
        let (tx, rx) = bounded(READ_CHANNEL_CAPACITY);
        thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn(move || pump_output(&mut source, &tx))
            .map_err(|e| PtyError::Open(format!("failed to spawn reader thread: {e}")))?;
        Ok(Self {
            rx,
            finished: false,
        })
    }

    pub fn read_available(&mut self, timeout: Duration) -> Result<ReadChunk, PtyError> {
        if self.finished {
            return Ok(ReadChunk::Eof);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(ReadEvent::Data(bytes)) => Ok(ReadChunk::Data(bytes)),
            Ok(ReadEvent::Eof) | Err(RecvTimeoutError::Disconnected) => {
                self.finished = true;
                Ok(ReadChunk::Eof)
            }
            Ok(ReadEvent::Error(reason)) => {
                self.finished = true;
                Err(PtyError::Read(reason))
            }
            Err(RecvTimeoutError::Timeout) => Ok(ReadChunk::Pending),
        }
    }

    /// Returns whatever is already queued without waiting.
    pub fn drain_ready(&mut self) -> Vec<u8> {
        let mut drained = Vec::new();
        while !self.finished {
            match self.rx.try_recv() {
                Ok(ReadEvent::Data(bytes)) => drained.extend_from_slice(&bytes),
                Ok(ReadEvent::Eof | ReadEvent::Error(_)) => self.finished = true,
                Err(_) => break,
            }
        }
        drained
    }
}

fn pump_output(source: &mut Box<dyn Read + Send>, tx: &Sender<ReadEvent>) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        let event = match source.read(&mut buf) {
            Ok(0) => ReadEvent::Eof,
            Ok(n) => ReadEvent::Data(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_closed_pty(&e) => ReadEvent::Eof,
            Err(e) => ReadEvent::Error(e.to_string()),
        };
        let last = !matches!(event, ReadEvent::Data(_));
        if tx.send(event).is_err() || last {
            return;
        }
    }
}

/// Linux reports EIO on the master once every slave descriptor is closed.
fn is_closed_pty(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EIO)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}
