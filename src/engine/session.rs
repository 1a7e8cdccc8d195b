//! Stream orchestrator: consumes an ordered diff-line stream, drives the
//! cursor, materializes blocks, and manages session-level resolution.
//!
//! All state lives behind one lock, so the async event pump and user-driven
//! block resolution serialize into FIFO, non-overlapping applications — the
//! single-writer rule the cursor/line arithmetic depends on. Independent
//! sessions over different buffers share nothing and run in parallel.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::domain::{
    BlockError, BufferError, DiffLineEvent, DiffLineKind, SessionError, SessionStatus, StatusUpdate,
};
use crate::engine::block::{BlockId, DiffBlock};
use crate::engine::progress::ProgressTracker;
use crate::infra::buffer::LineBuffer;
use crate::infra::decorations::DecorationHost;
use crate::infra::stream::{DiffLineMessage, DiffRequest, DiffService, RawDiffLine};

/// Construction parameters for a session.
///
/// `target_range` is the inclusive line range the edit was requested for;
/// it seeds the pending-marker pool and the initial cursor. The id fields
/// are echoed verbatim into every status update.
#[derive(Default)]
pub struct SessionOptions {
    pub target_range: (usize, usize),
    pub stream_id: Option<String>,
    pub tool_call_id: Option<String>,
    pub filepath: Option<String>,
    pub status_tx: Option<mpsc::UnboundedSender<StatusUpdate>>,
    pub close_signal: Option<oneshot::Sender<()>>,
}

/// Read-only copy of a block's state, for observers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub start_line: usize,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub finalized: bool,
}

struct SessionInner<B, D> {
    buffer: B,
    decorations: D,
    cursor: usize,
    blocks: Vec<DiffBlock>,
    open_block: Option<BlockId>,
    next_block_id: u64,
    status: SessionStatus,
    started: bool,
    has_resolved_any: bool,
    mutation_count: usize,
    progress: ProgressTracker,
    status_tx: Option<mpsc::UnboundedSender<StatusUpdate>>,
    close_signal: Option<oneshot::Sender<()>>,
    stream_id: Option<String>,
    tool_call_id: Option<String>,
    filepath: Option<String>,
}

/// One streaming edit session over one buffer.
///
/// Cheap to clone; clones share the same session. A session streams at most
/// once — a new edit requires a new instance.
pub struct DiffStreamSession<B, D> {
    inner: Arc<Mutex<SessionInner<B, D>>>,
}

impl<B, D> Clone for DiffStreamSession<B, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: LineBuffer, D: DecorationHost> DiffStreamSession<B, D> {
    pub fn new(buffer: B, decorations: D, options: SessionOptions) -> Self {
        let SessionOptions {
            target_range,
            stream_id,
            tool_call_id,
            filepath,
            status_tx,
            close_signal,
        } = options;

        let mut decorations = decorations;
        let progress = ProgressTracker::seed(
            &mut decorations,
            target_range.0,
            target_range.1,
            buffer.line_count(),
        );

        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                cursor: target_range.0,
                buffer,
                decorations,
                blocks: Vec::new(),
                open_block: None,
                next_block_id: 0,
                status: SessionStatus::Idle,
                started: false,
                has_resolved_any: false,
                mutation_count: 0,
                progress,
                status_tx,
                close_signal,
                stream_id,
                tool_call_id,
                filepath,
            })),
        }
    }

    /// Mark the session streaming and notify observers. Called by [`start`],
    /// or directly when the caller pumps messages itself.
    ///
    /// [`start`]: DiffStreamSession::start
    pub fn begin_streaming(&self) -> Result<(), SessionError> {
        self.inner.lock().begin_streaming()
    }

    /// Issue the diff-generation request and pump the response stream into
    /// this session on a background task. Returns the pump handle so callers
    /// can await stream completion.
    pub async fn start<S: DiffService>(
        &self,
        request: DiffRequest,
        service: &S,
    ) -> Result<tokio::task::JoinHandle<()>, SessionError>
    where
        B: Send + 'static,
        D: Send + 'static,
    {
        self.begin_streaming()?;
        let mut rx = service
            .request_diff(request)
            .await
            .map_err(SessionError::RequestFailed)?;

        let session = self.clone();
        Ok(tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let done = message.done;
                session.handle_message(message);
                if done {
                    break;
                }
            }
        }))
    }

    /// Route one wire message: a classified line or the terminal signal.
    pub fn handle_message(&self, message: DiffLineMessage) {
        if message.done {
            self.handle_stream_end();
        } else if let Some(raw) = message.content {
            self.handle_line(raw);
        }
    }

    /// Route one raw line, tolerating unrecognized kinds: a malformed line is
    /// logged and skipped with cursor, blocks, and progress all untouched.
    pub fn handle_line(&self, raw: RawDiffLine) {
        match raw.into_event() {
            Ok(event) => self.handle_event(event),
            Err(err) => log::warn!("skipping malformed diff line: {err}"),
        }
    }

    pub fn handle_event(&self, event: DiffLineEvent) {
        self.inner.lock().handle_event(event);
    }

    pub fn handle_stream_end(&self) {
        self.inner.lock().handle_stream_end();
    }

    /// Keep every streamed edit; release all decorations and finish.
    pub fn accept_all(&self) {
        self.inner.lock().accept_all();
    }

    /// Revert every uncommitted edit and finish. Best effort: revert failures
    /// are logged, decorations are always released.
    pub fn reject_all(&self) -> Result<(), SessionError> {
        self.inner.lock().reject_all()
    }

    /// Resolve one block by id. Unknown ids are ignored, which makes user
    /// resolution safe to race against in-flight streaming.
    pub fn resolve_block(&self, id: BlockId, accepted: bool) -> Result<(), BlockError> {
        self.inner.lock().resolve_block(id, accepted)
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock().status
    }

    pub fn cursor(&self) -> usize {
        self.inner.lock().cursor
    }

    pub fn block_count(&self) -> usize {
        self.inner.lock().blocks.len()
    }

    pub fn pending_markers(&self) -> usize {
        self.inner.lock().progress.pending_len()
    }

    pub fn block_snapshots(&self) -> Vec<BlockSnapshot> {
        self.inner
            .lock()
            .blocks
            .iter()
            .map(|block| BlockSnapshot {
                id: block.id(),
                start_line: block.start_line(),
                added: block.added().to_vec(),
                deleted: block.deleted().to_vec(),
                finalized: block.is_finalized(),
            })
            .collect()
    }

    pub fn with_buffer<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&self.inner.lock().buffer)
    }

    pub fn with_decorations<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.inner.lock().decorations)
    }
}

impl<B: LineBuffer, D: DecorationHost> SessionInner<B, D> {
    fn begin_streaming(&mut self) -> Result<(), SessionError> {
        if self.started {
            return Err(SessionError::AlreadyStarted);
        }
        self.started = true;
        self.status = SessionStatus::Streaming;
        self.emit(SessionStatus::Streaming);
        Ok(())
    }

    fn handle_event(&mut self, event: DiffLineEvent) {
        if self.status != SessionStatus::Streaming {
            log::debug!("dropping {:?} event: session not streaming", event.kind);
            return;
        }

        let kind = event.kind;
        let applied = match kind {
            DiffLineKind::Same => {
                self.finalize_open_block();
                self.cursor += 1;
                Ok(())
            }
            DiffLineKind::New => self.apply_insert(event.text),
            DiffLineKind::Old => self.apply_delete(),
        };

        match applied {
            Ok(()) => {
                self.progress.on_event(
                    &mut self.decorations,
                    kind,
                    self.cursor,
                    self.buffer.line_count(),
                );
            }
            Err(err) => {
                log::error!("buffer rejected {kind:?} event at line {}: {err}", self.cursor);
            }
        }
    }

    fn apply_insert(&mut self, text: String) -> Result<(), BufferError> {
        let idx = self.ensure_open_block();
        self.buffer.insert_line(self.cursor, &text)?;
        self.mutation_count += 1;
        self.blocks[idx].push_added(text, self.cursor, &mut self.decorations);
        self.cursor += 1;
        Ok(())
    }

    fn apply_delete(&mut self) -> Result<(), BufferError> {
        let idx = self.ensure_open_block();
        // The next line slides into the cursor's position: no advance.
        let removed = self.buffer.delete_line(self.cursor)?;
        self.mutation_count += 1;
        self.blocks[idx].push_deleted(removed);
        Ok(())
    }

    /// Index of the open block, creating one anchored at the cursor if none.
    /// The cursor only moves forward, so pushing keeps `blocks` ordered by
    /// start line.
    fn ensure_open_block(&mut self) -> usize {
        if let Some(id) = self.open_block
            && let Some(idx) = self.blocks.iter().position(|b| b.id() == id)
        {
            return idx;
        }
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.push(DiffBlock::new(id, self.cursor));
        self.open_block = Some(id);
        self.blocks.len() - 1
    }

    fn finalize_open_block(&mut self) {
        if let Some(id) = self.open_block.take()
            && let Some(block) = self.blocks.iter_mut().find(|b| b.id() == id)
        {
            block.finalize(&mut self.decorations);
        }
    }

    fn handle_stream_end(&mut self) {
        if self.status != SessionStatus::Streaming {
            return;
        }
        // A stream can end mid-hunk; `same` is not guaranteed to close it.
        self.finalize_open_block();
        self.progress.release_all(&mut self.decorations);

        if self.blocks.is_empty() {
            self.close();
        } else {
            self.status = SessionStatus::Done;
            self.emit(SessionStatus::Done);
        }
    }

    fn accept_all(&mut self) {
        if self.status == SessionStatus::Closed {
            return;
        }
        self.close();
    }

    fn reject_all(&mut self) -> Result<(), SessionError> {
        if self.status == SessionStatus::Closed {
            return Ok(());
        }

        let result = if !self.has_resolved_any {
            // Nothing was individually resolved, so every line-level mutation
            // since session start belongs to this stream: one bulk reversal.
            let steps = self.mutation_count;
            self.mutation_count = 0;
            self.buffer.undo(steps).map_err(SessionError::from)
        } else {
            // Bulk undo would also unwind the user's resolved decisions.
            // Revert each remaining block through its own reject path, last
            // block first so earlier anchors stay valid without reconciling.
            let mut blocks = std::mem::take(&mut self.blocks);
            self.open_block = None;
            let mut first_err = None;
            for block in blocks.iter_mut().rev() {
                if let Err(err) = block.reject(&mut self.buffer, &mut self.decorations) {
                    log::error!("reject-all: {err}");
                    first_err.get_or_insert(err);
                }
            }
            first_err.map_or(Ok(()), |err| Err(err.into()))
        };

        if let Err(err) = &result {
            log::error!("reject-all left unreverted content: {err}");
        }
        self.close();
        result
    }

    fn resolve_block(&mut self, id: BlockId, accepted: bool) -> Result<(), BlockError> {
        if self.status == SessionStatus::Closed {
            return Ok(());
        }
        let Some(idx) = self.blocks.iter().position(|b| b.id() == id) else {
            log::debug!("ignoring resolution of unknown block {id:?}");
            return Ok(());
        };

        let mut block = self.blocks.remove(idx);
        if self.open_block == Some(id) {
            // Stop routing stream events to a resolved block.
            self.open_block = None;
        }
        self.has_resolved_any = true;

        let line_s = block.start_line();
        let mut delta = 0isize;
        let result = if accepted {
            block.accept(&mut self.decorations);
            Ok(())
        } else {
            match block.reject(&mut self.buffer, &mut self.decorations) {
                Ok(()) => {
                    delta = block.line_delta_on_reject();
                    Ok(())
                }
                Err(err) => {
                    // The atomic revert did not apply; line numbers are
                    // unchanged, so no reconciliation either.
                    log::error!("{err}");
                    Err(err)
                }
            }
        };

        if delta != 0 {
            // Edits at or below a point never retroactively move earlier
            // content: only blocks strictly after the resolved one shift.
            for other in self.blocks.iter_mut() {
                if other.start_line() > line_s {
                    other.shift_by(delta, &mut self.decorations);
                }
            }
        }

        if self.blocks.is_empty() {
            self.close();
        } else {
            self.emit(SessionStatus::Done);
        }
        result
    }

    /// Terminal transition: release every decoration still owned by the
    /// session, notify `closed`, fire the external close signal.
    fn close(&mut self) {
        let mut blocks = std::mem::take(&mut self.blocks);
        for block in &mut blocks {
            block.release_decorations(&mut self.decorations);
        }
        self.open_block = None;
        self.progress.release_all(&mut self.decorations);
        self.status = SessionStatus::Closed;
        self.emit(SessionStatus::Closed);
        if let Some(tx) = self.close_signal.take() {
            let _ = tx.send(());
        }
        log::debug!("session closed");
    }

    fn emit(&self, status: SessionStatus) {
        if let Some(tx) = &self.status_tx {
            let _ = tx.send(StatusUpdate {
                num_diffs: self.blocks.len(),
                stream_id: self.stream_id.clone(),
                status,
                file_content: String::new(),
                tool_call_id: self.tool_call_id.clone(),
                filepath: self.filepath.clone(),
            });
        }
    }
}
