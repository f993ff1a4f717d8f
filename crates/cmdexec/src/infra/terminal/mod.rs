#![deny(clippy::all)]

pub mod error;
mod pty;

pub use error::{PtyError, SpawnFailureKind};
pub use pty::{PtyHandle, PtyReader, ReadChunk};

pub type Result<T> = std::result::Result<T, PtyError>;
