//! Live canonical-state subscription with self-healing reconnect.
//!
//! The feed is a small explicit state machine: `Connecting` while a new
//! subscription is being opened, `Open` while payloads flow, `Closed` after
//! any drop. Every payload is a full list snapshot that replaces displayed
//! state wholesale; a drop schedules a reconnect after a jittered delay and
//! nothing else. There is no retry cap: keeping the subscription alive is
//! permanent background behavior for the life of the view.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::client::SharedView;
use crate::protocol;
use crate::sync::SyncConfig;
use crate::transport::{PushEvent, PushSubscriber};

/// Connection lifecycle of the push subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Connecting,
    Open,
    Closed,
}

/// Task keeping a best-effort live subscription to the canonical list.
pub struct SnapshotFeed<P> {
    subscriber: P,
    shared: Arc<SharedView>,
    config: SyncConfig,
    cancel: CancellationToken,
    state_tx: watch::Sender<FeedState>,
}

impl<P: PushSubscriber> SnapshotFeed<P> {
    pub(crate) fn new(
        subscriber: P,
        shared: Arc<SharedView>,
        config: SyncConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (state_tx, _) = watch::channel(FeedState::Connecting);
        Self {
            subscriber,
            shared,
            config,
            cancel,
            state_tx,
        }
    }

    /// Observe state transitions. Subscribe before `run` to see them all.
    pub fn states(&self) -> watch::Receiver<FeedState> {
        self.state_tx.subscribe()
    }

    pub async fn run(self) {
        loop {
            self.transition(FeedState::Connecting);
            let connected = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.subscriber.connect() => result,
            };
            match connected {
                Ok(mut stream) => {
                    self.transition(FeedState::Open);
                    loop {
                        let event = tokio::select! {
                            _ = self.cancel.cancelled() => return,
                            event = stream.next_event() => event,
                        };
                        match event {
                            PushEvent::Message(payload) => self.handle_payload(&payload),
                            PushEvent::Disconnected(reason) => {
                                warn!(%reason, "push subscription lost");
                                break;
                            }
                        }
                    }
                }
                Err(err) => warn!(error = %err, "push subscription connect failed"),
            }
            self.transition(FeedState::Closed);

            let delay = reconnect_delay(&self.config, rand::thread_rng().gen_range(0.0..1.0));
            debug!(delay_ms = delay.as_millis() as u64, "waiting before resubscribing");
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = sleep(delay) => {}
            }
        }
    }

    fn handle_payload(&self, payload: &str) {
        match protocol::parse_snapshot(payload) {
            Ok(items) => {
                debug!(items = items.len(), "snapshot received");
                self.shared.apply_snapshot(items);
            }
            // Fatal to this event only; the stream stays up.
            Err(err) => error!(error = %err, "discarding malformed snapshot payload"),
        }
    }

    fn transition(&self, next: FeedState) {
        self.state_tx.send_replace(next);
    }
}

/// Uniform reconnect jitter: `base + unit * spread` for `unit` in [0, 1),
/// keeping the delay inside [base, base + spread).
pub fn reconnect_delay(config: &SyncConfig, unit: f64) -> Duration {
    config.reconnect_base + config.reconnect_spread.mul_f64(unit.clamp(0.0, 1.0))
}
