//! Line-buffer capability consumed by the engine.
//!
//! The engine never owns the text it edits; it drives a host buffer through
//! this trait. The host is expected to treat every `insert_line`/`delete_line`
//! as one undoable step and to apply `replace_lines` atomically — the engine
//! relies on both when reverting edits.

use crate::domain::BufferError;

/// Line-indexed read/insert/delete over mutable text.
pub trait LineBuffer {
    fn line_count(&self) -> usize;

    /// Text of the line at `index`, or `None` when out of bounds.
    fn line(&self, index: usize) -> Option<&str>;

    /// Insert `text` as a new line at `index`, shifting later lines down.
    fn insert_line(&mut self, index: usize, text: &str) -> Result<(), BufferError>;

    /// Delete the line at `index`, returning its text.
    fn delete_line(&mut self, index: usize) -> Result<String, BufferError>;

    /// Replace `count` lines starting at `start` with `lines`, as one atomic
    /// edit: on error the buffer is unchanged.
    fn replace_lines(
        &mut self,
        start: usize,
        count: usize,
        lines: &[String],
    ) -> Result<(), BufferError>;

    /// Reverse the last `steps` line-level mutations.
    fn undo(&mut self, steps: usize) -> Result<(), BufferError>;
}

/// Inverse of one applied mutation, replayed by `undo`.
#[derive(Debug, Clone)]
enum UndoStep {
    RemoveLine { index: usize },
    ReinsertLine { index: usize, text: String },
    RestoreRange { start: usize, removed: Vec<String>, inserted: usize },
}

/// In-memory `LineBuffer` with an undo journal.
///
/// Backs the CLI and the test suite; hosts embedding the engine supply their
/// own adapter over the real editing surface.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    lines: Vec<String>,
    journal: Vec<UndoStep>,
}

impl MemoryBuffer {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            journal: Vec::new(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(str::to_string).collect())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    fn check_index(&self, index: usize, inclusive_end: bool) -> Result<(), BufferError> {
        let limit = if inclusive_end {
            self.lines.len() + 1
        } else {
            self.lines.len()
        };
        if index >= limit {
            return Err(BufferError::OutOfBounds {
                index,
                count: self.lines.len(),
            });
        }
        Ok(())
    }

    fn apply_undo(&mut self, step: UndoStep) {
        match step {
            UndoStep::RemoveLine { index } => {
                self.lines.remove(index);
            }
            UndoStep::ReinsertLine { index, text } => {
                self.lines.insert(index, text);
            }
            UndoStep::RestoreRange {
                start,
                removed,
                inserted,
            } => {
                self.lines.splice(start..start + inserted, removed);
            }
        }
    }
}

impl LineBuffer for MemoryBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn insert_line(&mut self, index: usize, text: &str) -> Result<(), BufferError> {
        self.check_index(index, true)?;
        self.lines.insert(index, text.to_string());
        self.journal.push(UndoStep::RemoveLine { index });
        Ok(())
    }

    fn delete_line(&mut self, index: usize) -> Result<String, BufferError> {
        self.check_index(index, false)?;
        let text = self.lines.remove(index);
        self.journal.push(UndoStep::ReinsertLine {
            index,
            text: text.clone(),
        });
        Ok(text)
    }

    fn replace_lines(
        &mut self,
        start: usize,
        count: usize,
        lines: &[String],
    ) -> Result<(), BufferError> {
        if start + count > self.lines.len() {
            return Err(BufferError::OutOfBounds {
                index: start + count,
                count: self.lines.len(),
            });
        }
        let removed: Vec<String> = self
            .lines
            .splice(start..start + count, lines.iter().cloned())
            .collect();
        self.journal.push(UndoStep::RestoreRange {
            start,
            removed,
            inserted: lines.len(),
        });
        Ok(())
    }

    fn undo(&mut self, steps: usize) -> Result<(), BufferError> {
        if steps > self.journal.len() {
            return Err(BufferError::UndoExhausted { requested: steps });
        }
        for _ in 0..steps {
            if let Some(step) = self.journal.pop() {
                self.apply_undo(step);
            }
        }
        Ok(())
    }
}
