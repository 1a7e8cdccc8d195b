//! Decoration-host capability.
//!
//! The host surface owns the actual visuals; the engine only asks it to place
//! a decoration of some kind on a line, move it, or retire it. Handles are
//! opaque ids assigned by the host, and every handle the engine acquires must
//! be released on every exit path (resolution, reset, or stream end).

/// Visual category assigned to a line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorationKind {
    /// Movable marker for the line the stream is currently working on.
    ProgressCursor,
    /// One marker per not-yet-consumed line of the originally targeted range.
    PendingRegion,
    /// Marker on a line inserted by the stream.
    InsertedLine,
    /// Read-only preview of deleted text, rendered just above a block.
    DeletedPreview { text: String },
    /// Accept/reject control for a finalized block.
    Affordance,
}

/// Opaque handle to a placed decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecorationHandle(pub u64);

/// Capability for placing and retiring decorations on the host surface.
pub trait DecorationHost {
    fn place(&mut self, kind: DecorationKind, line: usize) -> DecorationHandle;
    fn move_to(&mut self, handle: DecorationHandle, line: usize);
    fn release(&mut self, handle: DecorationHandle);
}

/// One live decoration tracked by [`RecordingDecorations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveDecoration {
    pub handle: DecorationHandle,
    pub kind: DecorationKind,
    pub line: usize,
}

/// Journaling `DecorationHost` used by the CLI and tests.
///
/// Tracks live handles so leak checks can assert that every terminal
/// transition released everything it acquired.
#[derive(Debug, Default)]
pub struct RecordingDecorations {
    next_id: u64,
    live: Vec<LiveDecoration>,
    released: Vec<DecorationHandle>,
}

impl RecordingDecorations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> &[LiveDecoration] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of(&self, matches: impl Fn(&DecorationKind) -> bool) -> Vec<&LiveDecoration> {
        self.live.iter().filter(|d| matches(&d.kind)).collect()
    }

    pub fn released_count(&self) -> usize {
        self.released.len()
    }
}

impl DecorationHost for RecordingDecorations {
    fn place(&mut self, kind: DecorationKind, line: usize) -> DecorationHandle {
        let handle = DecorationHandle(self.next_id);
        self.next_id += 1;
        self.live.push(LiveDecoration { handle, kind, line });
        handle
    }

    fn move_to(&mut self, handle: DecorationHandle, line: usize) {
        if let Some(live) = self.live.iter_mut().find(|d| d.handle == handle) {
            live.line = line;
        } else {
            log::warn!("move_to on unknown decoration handle {handle:?}");
        }
    }

    fn release(&mut self, handle: DecorationHandle) {
        if let Some(pos) = self.live.iter().position(|d| d.handle == handle) {
            self.live.remove(pos);
            self.released.push(handle);
        } else {
            log::warn!("release on unknown decoration handle {handle:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_move_release_lifecycle() {
        let mut host = RecordingDecorations::new();
        let handle = host.place(DecorationKind::ProgressCursor, 3);
        assert_eq!(host.live_count(), 1);
        assert_eq!(host.live()[0].line, 3);

        host.move_to(handle, 7);
        assert_eq!(host.live()[0].line, 7);

        host.release(handle);
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.released_count(), 1);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut host = RecordingDecorations::new();
        let a = host.place(DecorationKind::PendingRegion, 0);
        host.release(a);
        let b = host.place(DecorationKind::PendingRegion, 0);
        assert_ne!(a, b);
    }
}
