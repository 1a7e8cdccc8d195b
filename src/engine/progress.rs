//! Pending-marker pool and current-position marker for an in-flight stream.
//!
//! Seeded with one pending marker per line of the originally targeted range.
//! `same`/`new` events each consume one line of that range moving forward and
//! retire the earliest remaining marker; `old` removes a line without having
//! matched it against a pending slot, so it retires nothing. This asymmetry
//! is preserved as observed host behavior.

use std::collections::VecDeque;

use crate::domain::DiffLineKind;
use crate::infra::decorations::{DecorationHandle, DecorationHost, DecorationKind};

#[derive(Debug, Default)]
pub struct ProgressTracker {
    pending: VecDeque<DecorationHandle>,
    cursor_mark: Option<DecorationHandle>,
}

impl ProgressTracker {
    /// Seed one pending marker per line in `[start_line, end_line]`, clamped
    /// to buffer bounds. No current-position marker yet.
    pub fn seed<D: DecorationHost>(
        decorations: &mut D,
        start_line: usize,
        end_line: usize,
        line_count: usize,
    ) -> Self {
        let mut pending = VecDeque::new();
        if line_count > 0 && start_line <= end_line && start_line < line_count {
            let last = end_line.min(line_count - 1);
            for line in start_line..=last {
                pending.push_back(decorations.place(DecorationKind::PendingRegion, line));
            }
        }
        Self {
            pending,
            cursor_mark: None,
        }
    }

    /// Track one consumed event: relocate the position marker to the cursor
    /// (clamped) and, unless the event was a deletion, retire the earliest
    /// remaining pending marker.
    pub fn on_event<D: DecorationHost>(
        &mut self,
        decorations: &mut D,
        kind: DiffLineKind,
        cursor: usize,
        line_count: usize,
    ) {
        if line_count > 0 {
            let line = cursor.min(line_count - 1);
            match self.cursor_mark {
                Some(handle) => decorations.move_to(handle, line),
                None => {
                    self.cursor_mark = Some(decorations.place(DecorationKind::ProgressCursor, line));
                }
            }
        }

        if kind != DiffLineKind::Old
            && let Some(handle) = self.pending.pop_front()
        {
            decorations.release(handle);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Release every remaining marker unconditionally.
    pub fn release_all<D: DecorationHost>(&mut self, decorations: &mut D) {
        for handle in self.pending.drain(..) {
            decorations.release(handle);
        }
        if let Some(handle) = self.cursor_mark.take() {
            decorations.release(handle);
        }
    }
}
