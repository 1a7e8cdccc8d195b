//! Domain error types for the streaming diff engine.
//!
//! These represent failures at the engine's own boundaries. Host adapters
//! surface their problems as `BufferError`; the engine wraps what it cannot
//! recover from in `SessionError`/`BlockError` and logs what it can.

use thiserror::Error;

/// Errors raised by a line-buffer adapter.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("line index {index} out of bounds (line count {count})")]
    OutOfBounds { index: usize, count: usize },

    #[error("nothing left to undo (requested {requested} steps)")]
    UndoExhausted { requested: usize },

    #[error("buffer operation failed: {0}")]
    OperationFailed(#[from] anyhow::Error),
}

/// Errors raised by session-level operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,

    #[error("unrecognized diff line kind: {0:?}")]
    MalformedLine(String),

    #[error("diff request failed: {0}")]
    RequestFailed(#[from] anyhow::Error),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Block(#[from] BlockError),
}

/// Errors raised by per-block operations.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("failed to revert block at line {start_line}: {source}")]
    RevertFailed {
        start_line: usize,
        #[source]
        source: BufferError,
    },
}
