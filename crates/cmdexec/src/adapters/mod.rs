mod command_controller;
pub mod dto;

pub use command_controller::{ApiError, CommandController};
