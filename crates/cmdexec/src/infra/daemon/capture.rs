//! Background loop that moves PTY output into an executor's buffer.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::infra::daemon::executor::CommandExecutor;
use crate::infra::terminal::{PtyReader, ReadChunk};

/// Quiet period after the child exits before the stream is considered done
/// even without EOF. Background jobs can keep the terminal open.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(300);

pub(super) fn spawn(executor: Arc<CommandExecutor>, reader: PtyReader) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("capture-{}", executor.id().short()))
        .spawn(move || run(&executor, reader))
}

fn run(executor: &CommandExecutor, mut reader: PtyReader) {
    let poll = executor.poll_interval();
    // A timeout too large to represent as an instant never fires.
    let mut deadline = executor.timeout().and_then(|t| Instant::now().checked_add(t));
    let mut exited_at: Option<Instant> = None;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            executor.expire();
            deadline = None;
        }

        match reader.read_available(poll) {
            Ok(ReadChunk::Data(bytes)) => executor.append_output(&bytes),
            Ok(ReadChunk::Pending) => {
                if !executor.has_exited() {
                    continue;
                }
                let since = *exited_at.get_or_insert_with(Instant::now);
                if since.elapsed() >= EXIT_DRAIN_GRACE {
                    let rest = reader.drain_ready();
                    executor.append_output(&rest);
                    debug!(process_id = %executor.id(), "Child exited without closing output");
                    break;
                }
            }
            Ok(ReadChunk::Eof) => break,
            Err(e) => {
                warn!(
                    process_id = %executor.id(),
                    error = %e,
                    "Output capture stopped on read error; keeping captured output"
                );
                break;
            }
        }
    }

    while !executor.has_exited() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            executor.expire();
            break;
        }
        thread::sleep(poll);
    }

    executor.finalize();
}
