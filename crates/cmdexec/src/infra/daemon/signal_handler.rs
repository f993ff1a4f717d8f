use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::thread::{self, JoinHandle};
use tracing::info;

use crate::common::DaemonError;
use crate::usecases::ports::ShutdownNotifierHandle;

pub struct SignalHandler {
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl SignalHandler {
    /// Watches for SIGINT/SIGTERM on a dedicated thread. The first one wakes
    /// `notifier`.
    pub fn setup(notifier: ShutdownNotifierHandle) -> Result<Self, DaemonError> {
        let mut signals =
            Signals::new([SIGINT, SIGTERM]).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;

        let handle = thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    info!(signal = sig, "Received signal, stopping command service");
                    notifier.notify();
                }
            })
            .map_err(|e| {
                DaemonError::SignalSetup(format!("failed to spawn signal handler: {}", e))
            })?;

        Ok(Self { handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::ports::ShutdownNotifier;
    use std::sync::Arc;
    use std::sync::mpsc::{self, Sender};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ChannelNotifier(Mutex<Sender<()>>);

    impl ShutdownNotifier for ChannelNotifier {
        fn notify(&self) {
            let _ = self.0.lock().unwrap().send(());
        }
    }

    #[test]
    fn test_sigterm_wakes_notifier() {
        let (tx, rx) = mpsc::channel();
        let _handler = SignalHandler::setup(Arc::new(ChannelNotifier(Mutex::new(tx)))).unwrap();

        signal_hook::low_level::raise(SIGTERM).unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
