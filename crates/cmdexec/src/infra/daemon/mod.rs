mod capture;
pub mod config;
mod executor;
mod output_buffer;
mod registry;
#[cfg(unix)]
pub mod signal_handler;

pub use config::ServiceConfig;
pub use executor::CommandExecutor;
pub use registry::ProcessRegistry;
#[cfg(unix)]
pub use signal_handler::SignalHandler;
