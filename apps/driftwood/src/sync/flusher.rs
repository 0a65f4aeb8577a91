use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{EditBuffer, SyncConfig};
use crate::client::SharedView;
use crate::protocol::BatchEntry;
use crate::transport::BatchSink;

/// Perpetual task converting pending edits into submitted batches.
///
/// Each cycle drains the buffer, submits the drained edits in fixed-size
/// chunks, then sleeps one frame interval. Chunks go out strictly one at a
/// time: a failed chunk is retried at a fixed interval forever, and the next
/// chunk is never started early, so the server observes a stable apply order
/// and at most one request is in flight. The in-flight ("dirty") flag is set
/// here but cleared only by the snapshot handler.
pub struct Flusher<S> {
    buffer: Arc<EditBuffer>,
    shared: Arc<SharedView>,
    sink: Arc<S>,
    config: SyncConfig,
    visibility: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl<S: BatchSink> Flusher<S> {
    pub(crate) fn new(
        buffer: Arc<EditBuffer>,
        shared: Arc<SharedView>,
        sink: Arc<S>,
        config: SyncConfig,
        visibility: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            buffer,
            shared,
            sink,
            config,
            visibility,
            cancel,
        }
    }

    pub async fn run(mut self) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }
            if !self.wait_visible().await {
                return;
            }

            let drained = self.buffer.drain_all();
            if !drained.is_empty() {
                self.shared.mark_dirty();
                let batch: Vec<BatchEntry> = drained
                    .into_iter()
                    .map(|(id, edit)| BatchEntry::from_edit(id, edit))
                    .collect();
                for chunk in batch.chunks(self.config.chunk_size.max(1)) {
                    if !self.submit_until_accepted(chunk).await {
                        return;
                    }
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = sleep(self.config.frame_interval) => {}
            }
        }
    }

    /// Resubmit the same chunk at a fixed interval until the sink accepts
    /// it. Returns false only when cancelled.
    async fn submit_until_accepted(&self, chunk: &[BatchEntry]) -> bool {
        let mut attempt = 0u64;
        loop {
            attempt += 1;
            match self.sink.submit(chunk).await {
                Ok(()) => {
                    debug!(entries = chunk.len(), attempt, "batch accepted");
                    return true;
                }
                Err(err) => {
                    warn!(
                        entries = chunk.len(),
                        attempt,
                        error = %err,
                        "batch submission failed, retrying"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return false,
                        _ = sleep(self.config.retry_delay) => {}
                    }
                }
            }
        }
    }

    /// Park until the embedding view is visible. No drains are attempted
    /// while backgrounded. Returns false only when cancelled.
    async fn wait_visible(&mut self) -> bool {
        loop {
            if *self.visibility.borrow() {
                return true;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                changed = self.visibility.changed() => {
                    // Sender gone means no embedder is toggling visibility
                    // anymore; run unconditionally.
                    if changed.is_err() {
                        return true;
                    }
                }
            }
        }
    }
}
