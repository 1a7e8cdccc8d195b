use serde::{Deserialize, Serialize};

/// Session lifecycle status as reported to observers.
///
/// `Closed` is terminal; a new session requires a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created but not yet started.
    #[default]
    Idle,
    /// Diff lines are being consumed.
    Streaming,
    /// The stream ended with unresolved blocks remaining.
    Done,
    /// No blocks remain; the session is finished.
    Closed,
}

/// Snapshot emitted to the observer channel on every material state change.
///
/// `file_content` is a placeholder field carried for wire compatibility,
/// not a live snapshot of the buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub num_diffs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    pub status: SessionStatus,
    #[serde(default)]
    pub file_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
}
