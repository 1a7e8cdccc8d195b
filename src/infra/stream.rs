//! Wire interface to the external diff-generation service.
//!
//! One request is issued per session; the response arrives as a sequence of
//! line messages over a channel and ends with a terminal `done` message.
//! Unrecognized line kinds are tolerated by the consumer, not rejected here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{DiffLineEvent, DiffLineKind, SessionError};

/// Parameters of a diff-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRequest {
    pub input: String,
    pub prefix: String,
    pub highlighted: String,
    pub suffix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub model_title: String,
    pub include_rules_in_system_message: bool,
}

/// Raw classified line as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDiffLine {
    #[serde(rename = "type")]
    pub kind: String,
    pub line: String,
}

impl RawDiffLine {
    pub fn new(kind: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            line: line.into(),
        }
    }

    /// Map the wire tag onto a [`DiffLineEvent`]. Unknown tags are a
    /// recoverable error the session logs and skips.
    pub fn into_event(self) -> Result<DiffLineEvent, SessionError> {
        let kind = match self.kind.as_str() {
            "same" => DiffLineKind::Same,
            "new" => DiffLineKind::New,
            "old" => DiffLineKind::Old,
            other => return Err(SessionError::MalformedLine(other.to_string())),
        };
        Ok(DiffLineEvent::new(kind, self.line))
    }
}

/// One message of the diff-generation response stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLineMessage {
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<RawDiffLine>,
}

impl DiffLineMessage {
    pub fn line(kind: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            done: false,
            content: Some(RawDiffLine::new(kind, line)),
        }
    }

    pub fn finished() -> Self {
        Self {
            done: true,
            content: None,
        }
    }
}

/// Capability that issues the diff-generation request and returns the
/// response channel. The transport (process, socket, in-process model) is
/// the implementor's concern.
#[async_trait]
pub trait DiffService {
    async fn request_diff(
        &self,
        request: DiffRequest,
    ) -> anyhow::Result<mpsc::UnboundedReceiver<DiffLineMessage>>;
}

/// Replays a fixed message script. Backs the CLI and integration tests.
///
/// A terminal `done` message is always appended, so scripts only list lines.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDiffService {
    messages: Vec<DiffLineMessage>,
}

impl ScriptedDiffService {
    pub fn new(messages: Vec<DiffLineMessage>) -> Self {
        Self { messages }
    }

    pub fn from_lines(lines: Vec<RawDiffLine>) -> Self {
        Self {
            messages: lines
                .into_iter()
                .map(|line| DiffLineMessage {
                    done: false,
                    content: Some(line),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl DiffService for ScriptedDiffService {
    async fn request_diff(
        &self,
        request: DiffRequest,
    ) -> anyhow::Result<mpsc::UnboundedReceiver<DiffLineMessage>> {
        log::debug!(
            "scripted diff request for model {} ({} messages)",
            request.model_title,
            self.messages.len()
        );
        let (tx, rx) = mpsc::unbounded_channel();
        for message in &self.messages {
            let _ = tx.send(message.clone());
        }
        let _ = tx.send(DiffLineMessage::finished());
        Ok(rx)
    }
}
