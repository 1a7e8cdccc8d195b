pub mod block;
pub mod progress;
pub mod session;

pub use block::{BlockId, DiffBlock};
pub use progress::ProgressTracker;
pub use session::{BlockSnapshot, DiffStreamSession, SessionOptions};
