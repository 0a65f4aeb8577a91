//! Client-side synchronization primitives.
//!
//! Local edits land in an [`EditBuffer`], coalesced per item id. The
//! [`Flusher`] drains the buffer on a display-aligned cadence, submits the
//! drained edits in fixed-size chunks, and retries a failed chunk at a fixed
//! interval until the server accepts it. Canonical confirmation arrives out
//! of band through the snapshot feed, which is the only place the in-flight
//! flag is cleared.

use std::time::Duration;

mod buffer;
mod flusher;

pub use buffer::EditBuffer;
pub use flusher::Flusher;

/// Tuning knobs for the flush loop and the snapshot feed.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on the number of edits submitted in one batch.
    pub chunk_size: usize,
    /// Fixed pause before a failed batch is tried again.
    pub retry_delay: Duration,
    /// Cadence of the drain loop while the view is visible.
    pub frame_interval: Duration,
    /// Minimum wait before reopening a dropped push subscription.
    pub reconnect_base: Duration,
    /// Random extra wait layered on top of `reconnect_base` so a fleet of
    /// clients does not reconnect in lockstep.
    pub reconnect_spread: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            retry_delay: Duration::from_secs(1),
            frame_interval: Duration::from_millis(16),
            reconnect_base: Duration::from_secs(10),
            reconnect_spread: Duration::from_secs(5),
        }
    }
}
