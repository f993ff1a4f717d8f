pub mod http_api;
mod server;

pub use http_api::build_router;
pub use server::start_daemon;
