//! Append-only byte buffer shared by a capture loop and status readers.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::common::mutex_lock_or_recover;

#[derive(Default)]
struct BufferState {
    bytes: Vec<u8>,
    sealed: bool,
}

/// Output of one command.
///
/// Written by exactly one capture loop. Once sealed the contents never
/// change again, and waiters on [`OutputBuffer::wait_sealed`] are released.
#[derive(Default)]
pub struct OutputBuffer {
    state: Mutex<BufferState>,
    sealed_cv: Condvar,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and drops the chunk when the buffer is already sealed.
    pub fn append(&self, chunk: &[u8]) -> bool {
        let mut state = mutex_lock_or_recover(&self.state);
        if state.sealed {
            return false;
        }
        state.bytes.extend_from_slice(chunk);
        true
    }

    pub fn seal(&self) {
        let mut state = mutex_lock_or_recover(&self.state);
        state.sealed = true;
        self.sealed_cv.notify_all();
    }

    /// Blocks until sealed or until `timeout` passes. Returns whether sealed.
    pub fn wait_sealed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = mutex_lock_or_recover(&self.state);
        while !state.sealed {
            state = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    match self.sealed_cv.wait_timeout(state, remaining) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    }
                }
                None => match self.sealed_cv.wait(state) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                },
            };
        }
        true
    }

    pub fn len(&self) -> usize {
        mutex_lock_or_recover(&self.state).bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes the contents as lossy UTF-8.
    ///
    /// Until sealed, a multi-byte sequence cut off at the end is left out so
    /// that successive snapshots only ever extend each other.
    pub fn snapshot(&self) -> String {
        let bytes = {
            let state = mutex_lock_or_recover(&self.state);
            let end = if state.sealed {
                state.bytes.len()
            } else {
                complete_utf8_len(&state.bytes)
            };
            state.bytes[..end].to_vec()
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Length of `bytes` without a trailing sequence that more bytes could still complete.
fn complete_utf8_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let byte = bytes[len - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = match byte {
            b if b & 0b1110_0000 == 0b1100_0000 => 2,
            b if b & 0b1111_0000 == 0b1110_0000 => 3,
            b if b & 0b1111_1000 == 0b1111_0000 => 4,
            _ => 1,
        };
        return if needed > back { len - back } else { len };
    }
    len
}
