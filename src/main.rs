//! Redline CLI entry point.
//!
//! Replays a JSON script of classified diff lines against a file, the same
//! way a host editor would stream them from a diff-generation service, then
//! bulk-resolves the session and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio::sync::mpsc;
use uuid::Uuid;

use redline::engine::{DiffStreamSession, SessionOptions};
use redline::infra::buffer::{LineBuffer, MemoryBuffer};
use redline::infra::config::load_config;
use redline::infra::decorations::RecordingDecorations;
use redline::infra::stream::{DiffRequest, RawDiffLine, ScriptedDiffService};

#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(version)]
#[command(about = "Apply a streamed line diff as reviewable blocks", long_about = None)]
struct Args {
    /// File whose contents the diff stream edits
    file: PathBuf,

    /// JSON array of classified lines: [{"type": "same"|"new"|"old", "line": "..."}]
    script: PathBuf,

    /// First line of the targeted range (0-based)
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Last line of the targeted range, inclusive (defaults to the last line)
    #[arg(long)]
    end: Option<usize>,

    /// How to resolve the whole session once the stream ends
    #[arg(long, value_enum, default_value_t = Resolution::Accept)]
    resolve: Resolution,

    /// Write the result back to the file instead of stdout
    #[arg(long)]
    write: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Resolution {
    /// Keep every streamed edit
    Accept,
    /// Revert every streamed edit
    Reject,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("read {}", args.file.display()))?;
    let script: Vec<RawDiffLine> = serde_json::from_str(
        &std::fs::read_to_string(&args.script)
            .with_context(|| format!("read {}", args.script.display()))?,
    )
    .context("parse diff-line script")?;

    let buffer = MemoryBuffer::from_text(&text);
    let end = args
        .end
        .unwrap_or_else(|| buffer.line_count().saturating_sub(1));

    let lines: Vec<&str> = text.lines().collect();
    let clamped_end = end.min(lines.len().saturating_sub(1));
    let request = {
        let config = load_config();
        DiffRequest {
            input: text.clone(),
            prefix: lines[..args.start.min(lines.len())].join("\n"),
            highlighted: if args.start <= clamped_end && !lines.is_empty() {
                lines[args.start..=clamped_end].join("\n")
            } else {
                String::new()
            },
            suffix: lines[(clamped_end + 1).min(lines.len())..].join("\n"),
            language: None,
            model_title: config.model_title,
            include_rules_in_system_message: config.include_rules_in_system_message,
        }
    };

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let session = DiffStreamSession::new(
        buffer,
        RecordingDecorations::new(),
        SessionOptions {
            target_range: (args.start, end),
            stream_id: Some(Uuid::new_v4().to_string()),
            tool_call_id: None,
            filepath: Some(args.file.display().to_string()),
            status_tx: Some(status_tx),
            close_signal: None,
        },
    );

    let status_task = tokio::spawn(async move {
        while let Some(update) = status_rx.recv().await {
            match serde_json::to_string(&update) {
                Ok(json) => log::info!("status {json}"),
                Err(err) => log::warn!("unserializable status update: {err}"),
            }
        }
    });

    let service = ScriptedDiffService::from_lines(script);
    let pump = session.start(request, &service).await?;
    pump.await.context("event pump panicked")?;

    match args.resolve {
        Resolution::Accept => session.accept_all(),
        Resolution::Reject => session.reject_all()?,
    }

    let result = session.with_buffer(|buf| buf.to_text());
    drop(session);
    status_task.await.context("status printer panicked")?;

    if args.write {
        std::fs::write(&args.file, format!("{result}\n"))
            .with_context(|| format!("write {}", args.file.display()))?;
    } else {
        println!("{result}");
    }
    Ok(())
}
