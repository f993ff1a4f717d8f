use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::adapters::CommandController;
use crate::app::daemon::build_router;
use crate::common::DaemonError;
use crate::infra::daemon::{ProcessRegistry, ServiceConfig};
use crate::infra::log_forwarder::HttpLogSink;
use crate::usecases::ports::{
    LogSinkHandle, NoopLogSink, ProcessRepository, ShutdownNotifier, ShutdownNotifierHandle,
};

const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

struct NotifyShutdown(Arc<Notify>);

impl ShutdownNotifier for NotifyShutdown {
    fn notify(&self) {
        self.0.notify_one();
    }
}

/// Runs the service until SIGINT/SIGTERM, then stops every command.
pub fn start_daemon(config: ServiceConfig) -> Result<(), DaemonError> {
    if !config.working_dir.is_dir() {
        return Err(DaemonError::Config(format!(
            "working directory {} does not exist",
            config.working_dir.display()
        )));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("cmdexec-http")
        .build()
        .map_err(|e| DaemonError::Runtime(e.to_string()))?;

    let log_sink: LogSinkHandle = match &config.log_url {
        Some(url) => match HttpLogSink::new(url, runtime.handle().clone()) {
            Ok(sink) => {
                info!(endpoint = %sink.endpoint(), "Forwarding activity to log service");
                Arc::new(sink)
            }
            Err(e) => {
                warn!(error = %e, "Log service URL unusable, activity forwarding disabled");
                Arc::new(NoopLogSink)
            }
        },
        None => Arc::new(NoopLogSink),
    };

    let listen = config.listen;
    info!(
        working_dir = %config.working_dir.display(),
        shell = %config.shell,
        "Starting command service"
    );
    let registry = Arc::new(ProcessRegistry::new(config, log_sink));
    let repository: Arc<dyn ProcessRepository> = Arc::clone(&registry) as Arc<dyn ProcessRepository>;
    let controller = Arc::new(CommandController::new(repository));

    let notify = Arc::new(Notify::new());
    let notifier: ShutdownNotifierHandle = Arc::new(NotifyShutdown(Arc::clone(&notify)));
    #[cfg(unix)]
    let _signals = crate::infra::daemon::SignalHandler::setup(notifier)?;
    #[cfg(not(unix))]
    drop(notifier);

    let result = runtime.block_on(serve(listen, build_router(controller), notify));

    info!(
        processes = registry.len(),
        running = registry.running_count(),
        "Stopping running commands"
    );
    registry.shutdown();
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn serve(listen: SocketAddr, router: Router, notify: Arc<Notify>) -> Result<(), DaemonError> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| DaemonError::Bind {
            addr: listen.to_string(),
            reason: e.to_string(),
        })?;
    let actual = listener.local_addr().unwrap_or(listen);
    info!(listen = %actual, "Command service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { notify.notified().await })
        .await
        .map_err(|e| DaemonError::Runtime(e.to_string()))
}
