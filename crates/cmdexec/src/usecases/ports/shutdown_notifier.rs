use std::sync::Arc;

pub trait ShutdownNotifier: Send + Sync {
    fn notify(&self);
}

pub type ShutdownNotifierHandle = Arc<dyn ShutdownNotifier>;
