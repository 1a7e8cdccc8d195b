pub mod buffer;
pub mod config;
pub mod decorations;
pub mod stream;

pub use buffer::{LineBuffer, MemoryBuffer};
pub use decorations::{DecorationHandle, DecorationHost, DecorationKind, RecordingDecorations};
pub use stream::{DiffLineMessage, DiffRequest, DiffService, RawDiffLine, ScriptedDiffService};
