pub mod domain;
pub mod engine;
pub mod infra;

pub use domain::{DiffLineEvent, DiffLineKind, SessionStatus, StatusUpdate};
pub use engine::{BlockId, BlockSnapshot, DiffStreamSession, SessionOptions};
pub use infra::{DiffRequest, DiffService, LineBuffer, MemoryBuffer};
