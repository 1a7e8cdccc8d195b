//! One contiguous replacement hunk and its accept/reject behavior.

use crate::domain::BlockError;
use crate::infra::buffer::LineBuffer;
use crate::infra::decorations::{DecorationHandle, DecorationHost, DecorationKind};

/// Opaque id for a block within its session's arena. Resolution is reported
/// by id; blocks hold no reference back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) u64);

/// A deleted-then-inserted hunk anchored at a buffer line.
///
/// The session performs the buffer mutations; the block records what was
/// added and removed and owns the decoration handles those mutations earned:
/// one inserted-line mark per added line, an optional deleted-text preview,
/// and an accept/reject affordance once finalized.
#[derive(Debug)]
pub struct DiffBlock {
    id: BlockId,
    start_line: usize,
    added: Vec<String>,
    deleted: Vec<String>,
    finalized: bool,
    line_marks: Vec<DecorationHandle>,
    preview: Option<DecorationHandle>,
    affordance: Option<DecorationHandle>,
}

impl DiffBlock {
    pub(crate) fn new(id: BlockId, start_line: usize) -> Self {
        Self {
            id,
            start_line,
            added: Vec::new(),
            deleted: Vec::new(),
            finalized: false,
            line_marks: Vec::new(),
            preview: None,
            affordance: None,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn added(&self) -> &[String] {
        &self.added
    }

    pub fn deleted(&self) -> &[String] {
        &self.deleted
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Net line-count change a reject of this block would cause.
    pub fn line_delta_on_reject(&self) -> isize {
        self.deleted.len() as isize - self.added.len() as isize
    }

    pub(crate) fn push_added<D: DecorationHost>(
        &mut self,
        text: String,
        buffer_line: usize,
        decorations: &mut D,
    ) {
        self.added.push(text);
        self.line_marks
            .push(decorations.place(DecorationKind::InsertedLine, buffer_line));
    }

    pub(crate) fn push_deleted(&mut self, text: String) {
        self.deleted.push(text);
    }

    /// Render the block's resolved affordances. Idempotent: a trailing `same`
    /// line and the end-of-stream hook may both call this.
    pub(crate) fn finalize<D: DecorationHost>(&mut self, decorations: &mut D) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        if !self.deleted.is_empty() {
            self.preview = Some(decorations.place(
                DecorationKind::DeletedPreview {
                    text: self.deleted.join("\n"),
                },
                self.start_line,
            ));
        }
        self.affordance = Some(decorations.place(DecorationKind::Affordance, self.start_line));
    }

    /// Relocate the block after a sibling's resolution changed line numbers.
    /// Never touches buffer content.
    pub(crate) fn shift_by<D: DecorationHost>(&mut self, delta: isize, decorations: &mut D) {
        let new_start = self.start_line.saturating_add_signed(delta);
        self.update_position(new_start, decorations);
    }

    pub(crate) fn update_position<D: DecorationHost>(
        &mut self,
        new_start: usize,
        decorations: &mut D,
    ) {
        self.start_line = new_start;
        if let Some(handle) = self.preview {
            decorations.move_to(handle, new_start);
        }
        if let Some(handle) = self.affordance {
            decorations.move_to(handle, new_start);
        }
    }

    /// Keep the inserted lines; drop only this block's decorations.
    pub(crate) fn accept<D: DecorationHost>(&mut self, decorations: &mut D) {
        self.release_decorations(decorations);
    }

    /// Reverse this block's edit: the buffer range currently holding the
    /// added lines is replaced by the deleted lines in one atomic buffer
    /// transaction. Decorations are released even when the revert fails, so
    /// no affordance dangles over unreverted content.
    pub(crate) fn reject<B: LineBuffer, D: DecorationHost>(
        &mut self,
        buffer: &mut B,
        decorations: &mut D,
    ) -> Result<(), BlockError> {
        let result = buffer.replace_lines(self.start_line, self.added.len(), &self.deleted);
        self.release_decorations(decorations);
        result.map_err(|source| BlockError::RevertFailed {
            start_line: self.start_line,
            source,
        })
    }

    pub(crate) fn release_decorations<D: DecorationHost>(&mut self, decorations: &mut D) {
        for handle in self.line_marks.drain(..) {
            decorations.release(handle);
        }
        if let Some(handle) = self.preview.take() {
            decorations.release(handle);
        }
        if let Some(handle) = self.affordance.take() {
            decorations.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BufferError;
    use crate::infra::buffer::MemoryBuffer;
    use crate::infra::decorations::RecordingDecorations;

    fn block_with(added: &[&str], deleted: &[&str], start: usize) -> (DiffBlock, RecordingDecorations) {
        let mut decorations = RecordingDecorations::new();
        let mut block = DiffBlock::new(BlockId(0), start);
        for (offset, text) in added.iter().enumerate() {
            block.push_added(text.to_string(), start + offset, &mut decorations);
        }
        for text in deleted {
            block.push_deleted(text.to_string());
        }
        block.finalize(&mut decorations);
        (block, decorations)
    }

    #[test]
    fn finalize_is_idempotent() {
        let (mut block, mut decorations) = block_with(&["x"], &["y"], 0);
        let count = decorations.live_count();
        block.finalize(&mut decorations);
        assert_eq!(decorations.live_count(), count);
    }

    #[test]
    fn finalize_without_deletions_skips_preview() {
        let (_, decorations) = block_with(&["x"], &[], 0);
        assert!(
            decorations
                .live_of(|k| matches!(k, DecorationKind::DeletedPreview { .. }))
                .is_empty()
        );
        assert_eq!(
            decorations
                .live_of(|k| matches!(k, DecorationKind::Affordance))
                .len(),
            1
        );
    }

    #[test]
    fn accept_releases_decorations_and_nothing_else() {
        let buffer = MemoryBuffer::from_text("a\nx\nb");
        let (mut block, mut decorations) = block_with(&["x"], &["old"], 1);

        block.accept(&mut decorations);

        assert_eq!(decorations.live_count(), 0);
        assert_eq!(buffer.lines(), &["a", "x", "b"]);
    }

    #[test]
    fn reject_restores_deleted_lines_in_order() {
        // Buffer currently holds the insertion: two added lines at index 1.
        let mut buffer = MemoryBuffer::from_text("a\nnew1\nnew2\nb");
        let (mut block, mut decorations) = block_with(&["new1", "new2"], &["old1", "old2", "old3"], 1);

        block.reject(&mut buffer, &mut decorations).unwrap();

        assert_eq!(buffer.lines(), &["a", "old1", "old2", "old3", "b"]);
        assert_eq!(decorations.live_count(), 0);
    }

    #[test]
    fn reject_failure_still_releases_decorations() {
        struct BrokenBuffer;
        impl LineBuffer for BrokenBuffer {
            fn line_count(&self) -> usize {
                0
            }
            fn line(&self, _index: usize) -> Option<&str> {
                None
            }
            fn insert_line(&mut self, index: usize, _text: &str) -> Result<(), BufferError> {
                Err(BufferError::OutOfBounds { index, count: 0 })
            }
            fn delete_line(&mut self, index: usize) -> Result<String, BufferError> {
                Err(BufferError::OutOfBounds { index, count: 0 })
            }
            fn replace_lines(
                &mut self,
                start: usize,
                _count: usize,
                _lines: &[String],
            ) -> Result<(), BufferError> {
                Err(BufferError::OutOfBounds {
                    index: start,
                    count: 0,
                })
            }
            fn undo(&mut self, steps: usize) -> Result<(), BufferError> {
                Err(BufferError::UndoExhausted { requested: steps })
            }
        }

        let (mut block, mut decorations) = block_with(&["x"], &["y"], 5);
        let err = block.reject(&mut BrokenBuffer, &mut decorations).unwrap_err();

        assert!(matches!(err, BlockError::RevertFailed { start_line: 5, .. }));
        assert_eq!(decorations.live_count(), 0);
    }

    #[test]
    fn shift_moves_anchor_and_affordances() {
        let (mut block, mut decorations) = block_with(&["x"], &["y"], 10);
        block.shift_by(-2, &mut decorations);
        assert_eq!(block.start_line(), 8);
        for live in decorations.live_of(|k| {
            matches!(
                k,
                DecorationKind::Affordance | DecorationKind::DeletedPreview { .. }
            )
        }) {
            assert_eq!(live.line, 8);
        }
    }
}
