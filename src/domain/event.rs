use serde::{Deserialize, Serialize};

/// Classification of one streamed diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    /// The line is unchanged; the cursor passes over it.
    Same,
    /// The line is inserted at the cursor.
    New,
    /// The line currently under the cursor is deleted.
    Old,
}

/// One diff-line event, produced externally and consumed exactly once,
/// in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLineEvent {
    pub kind: DiffLineKind,
    pub text: String,
}

impl DiffLineEvent {
    pub fn new(kind: DiffLineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn same(text: impl Into<String>) -> Self {
        Self::new(DiffLineKind::Same, text)
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(DiffLineKind::New, text)
    }

    pub fn removed() -> Self {
        Self::new(DiffLineKind::Old, String::new())
    }
}
