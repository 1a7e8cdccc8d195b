//! End-to-end tests driving the full async pipeline: scripted diff service,
//! background event pump, status channel, and user resolution.

use tokio::sync::{mpsc, oneshot};

use redline::domain::SessionStatus;
use redline::engine::{DiffStreamSession, SessionOptions};
use redline::infra::buffer::MemoryBuffer;
use redline::infra::decorations::RecordingDecorations;
use redline::infra::stream::{DiffRequest, RawDiffLine, ScriptedDiffService};

fn request() -> DiffRequest {
    DiffRequest {
        input: "fn main() {}".to_string(),
        prefix: String::new(),
        highlighted: "fn main() {}".to_string(),
        suffix: String::new(),
        language: Some("rust".to_string()),
        model_title: "test-model".to_string(),
        include_rules_in_system_message: false,
    }
}

#[tokio::test]
async fn streamed_replacement_then_accept_closes_the_session() {
    let script = vec![
        RawDiffLine::new("same", "line0"),
        RawDiffLine::new("same", "line1"),
        RawDiffLine::new("old", ""),
        RawDiffLine::new("new", "replacement"),
        RawDiffLine::new("same", "line3"),
    ];
    let service = ScriptedDiffService::from_lines(script);

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let (close_tx, close_rx) = oneshot::channel();
    let session = DiffStreamSession::new(
        MemoryBuffer::from_text("line0\nline1\nline2\nline3\nline4"),
        RecordingDecorations::new(),
        SessionOptions {
            target_range: (0, 4),
            stream_id: Some("stream-1".to_string()),
            tool_call_id: Some("call-1".to_string()),
            filepath: Some("demo.txt".to_string()),
            status_tx: Some(status_tx),
            close_signal: Some(close_tx),
        },
    );

    let pump = session.start(request(), &service).await.unwrap();
    pump.await.unwrap();

    assert_eq!(session.status(), SessionStatus::Done);
    let blocks = session.block_snapshots();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].start_line, 2);
    assert_eq!(blocks[0].deleted, vec!["line2"]);
    assert_eq!(blocks[0].added, vec!["replacement"]);

    session.resolve_block(blocks[0].id, true).unwrap();
    assert_eq!(session.status(), SessionStatus::Closed);
    session.with_buffer(|buf| {
        assert_eq!(
            buf.lines(),
            &["line0", "line1", "replacement", "line3", "line4"]
        );
    });
    session.with_decorations(|d| assert_eq!(d.live_count(), 0));

    close_rx.await.expect("close signal fired");

    let first = status_rx.recv().await.unwrap();
    assert_eq!(first.status, SessionStatus::Streaming);
    assert_eq!(first.stream_id.as_deref(), Some("stream-1"));
    assert_eq!(first.tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(first.filepath.as_deref(), Some("demo.txt"));

    let mut statuses = vec![first.status];
    while let Ok(update) = status_rx.try_recv() {
        statuses.push(update.status);
    }
    assert_eq!(
        statuses,
        vec![
            SessionStatus::Streaming,
            SessionStatus::Done,
            SessionStatus::Closed
        ]
    );
}

#[tokio::test]
async fn malformed_lines_in_the_wire_stream_are_tolerated() {
    let script = vec![
        RawDiffLine::new("same", "line0"),
        RawDiffLine::new("weird", "???"),
        RawDiffLine::new("old", ""),
        RawDiffLine::new("new", "x"),
    ];
    let service = ScriptedDiffService::from_lines(script);

    let session = DiffStreamSession::new(
        MemoryBuffer::from_text("line0\nline1\nline2"),
        RecordingDecorations::new(),
        SessionOptions {
            target_range: (0, 2),
            ..Default::default()
        },
    );

    let pump = session.start(request(), &service).await.unwrap();
    pump.await.unwrap();

    // Stream ended mid-hunk: the open block is finalized by the terminal
    // message, not by a trailing `same`.
    let blocks = session.block_snapshots();
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].finalized);
    assert_eq!(blocks[0].start_line, 1);
    assert_eq!(blocks[0].deleted, vec!["line1"]);
    assert_eq!(blocks[0].added, vec!["x"]);
    session.with_buffer(|buf| assert_eq!(buf.lines(), &["line0", "x", "line2"]));
}

#[tokio::test]
async fn reject_all_after_streaming_restores_the_original_text() {
    let script = vec![
        RawDiffLine::new("old", ""),
        RawDiffLine::new("new", "intro"),
        RawDiffLine::new("same", "line1"),
        RawDiffLine::new("new", "tail"),
    ];
    let service = ScriptedDiffService::from_lines(script);

    let session = DiffStreamSession::new(
        MemoryBuffer::from_text("line0\nline1\nline2"),
        RecordingDecorations::new(),
        SessionOptions {
            target_range: (0, 2),
            ..Default::default()
        },
    );

    let pump = session.start(request(), &service).await.unwrap();
    pump.await.unwrap();
    assert_eq!(session.block_count(), 2);

    session.reject_all().unwrap();
    assert_eq!(session.status(), SessionStatus::Closed);
    session.with_buffer(|buf| assert_eq!(buf.lines(), &["line0", "line1", "line2"]));
    session.with_decorations(|d| assert_eq!(d.live_count(), 0));
}

#[tokio::test]
async fn a_session_streams_at_most_once() {
    let service = ScriptedDiffService::from_lines(vec![RawDiffLine::new("same", "line0")]);
    let session = DiffStreamSession::new(
        MemoryBuffer::from_text("line0"),
        RecordingDecorations::new(),
        SessionOptions::default(),
    );

    let pump = session.start(request(), &service).await.unwrap();
    pump.await.unwrap();

    assert!(session.start(request(), &service).await.is_err());
}
