pub mod error;
pub mod event;
pub mod status;

pub use error::{BlockError, BufferError, SessionError};
pub use event::{DiffLineEvent, DiffLineKind};
pub use status::{SessionStatus, StatusUpdate};
