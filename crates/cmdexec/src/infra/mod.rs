pub mod daemon;
pub mod log_forwarder;
pub mod terminal;
