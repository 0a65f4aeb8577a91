//! View-facing state and assembly.
//!
//! [`TodoController`] raises user intent into the edit buffer and publishes
//! a fresh [`ViewState`] on every change. [`TodoClient`] wires the buffer,
//! the flusher, and the snapshot feed together and spawns the background
//! tasks. The "busy" signal means "local edits not yet drained OR submitted
//! edits not yet confirmed by a snapshot". The two halves are tracked
//! separately, and only snapshots clear the second.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::model::{ItemId, PendingEdit, TodoItem};
use crate::subscription::{FeedState, SnapshotFeed};
use crate::sync::{EditBuffer, Flusher, SyncConfig};
use crate::transport::{BatchSink, IdSource, PushSubscriber};

/// Everything a renderer needs in order to draw the list.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub items: Vec<TodoItem>,
    /// Local edits exist that the server has not yet confirmed.
    pub busy: bool,
    /// An add was raised and no snapshot has confirmed it yet. Embedders
    /// disable the add control while set to stop rapid double-submission
    /// from the same control.
    pub adding: bool,
    /// Rows with a submitted edit awaiting confirmation. Embedders lock
    /// these rows until the next snapshot replaces them.
    pub locked: HashSet<ItemId>,
    /// How long the initial snapshot fetch took. Display only.
    pub initial_fetch: Duration,
}

/// Canonical state handed to the client at startup: a pre-fetched list and
/// the observed fetch latency.
#[derive(Debug, Clone)]
pub struct InitialSnapshot {
    pub items: Vec<TodoItem>,
    pub fetch_latency: Duration,
}

struct ViewInner {
    items: Vec<TodoItem>,
    dirty: bool,
    adding: bool,
    locked: HashSet<ItemId>,
    initial_fetch: Duration,
}

/// State shared between the controller, the flusher, and the feed. All
/// mutations publish through a single watch channel, and snapshot
/// application is one locked update: replace the list, clear the dirty and
/// adding flags, unlock every row, publish once. One snapshot can never make
/// the UI flash busy, then idle, then busy again.
pub(crate) struct SharedView {
    buffer: Arc<EditBuffer>,
    inner: Mutex<ViewInner>,
    tx: watch::Sender<ViewState>,
}

impl SharedView {
    fn new(buffer: Arc<EditBuffer>, initial: InitialSnapshot) -> (Arc<Self>, watch::Receiver<ViewState>) {
        let inner = ViewInner {
            items: initial.items,
            dirty: false,
            adding: false,
            locked: HashSet::new(),
            initial_fetch: initial.fetch_latency,
        };
        let state = ViewState {
            items: inner.items.clone(),
            busy: false,
            adding: false,
            locked: HashSet::new(),
            initial_fetch: inner.initial_fetch,
        };
        let (tx, rx) = watch::channel(state);
        let shared = Arc::new(Self {
            buffer,
            inner: Mutex::new(inner),
            tx,
        });
        (shared, rx)
    }

    fn publish(&self, inner: &ViewInner) {
        let state = ViewState {
            items: inner.items.clone(),
            busy: !self.buffer.is_empty() || inner.dirty,
            adding: inner.adding,
            locked: inner.locked.clone(),
            initial_fetch: inner.initial_fetch,
        };
        self.tx.send_replace(state);
    }

    fn record_add(&self, id: ItemId, edit: PendingEdit) {
        let mut inner = self.inner.lock();
        self.buffer.record(id, edit);
        inner.adding = true;
        self.publish(&inner);
    }

    fn record_save(&self, id: ItemId, edit: PendingEdit) {
        let mut inner = self.inner.lock();
        self.buffer.record(id.clone(), edit);
        inner.locked.insert(id);
        self.publish(&inner);
    }

    /// Submission went in flight; cleared only by `apply_snapshot`.
    pub(crate) fn mark_dirty(&self) {
        let mut inner = self.inner.lock();
        inner.dirty = true;
        self.publish(&inner);
    }

    /// Replace displayed state wholesale with a canonical snapshot.
    pub(crate) fn apply_snapshot(&self, items: Vec<TodoItem>) {
        let mut inner = self.inner.lock();
        inner.items = items;
        inner.dirty = false;
        inner.adding = false;
        inner.locked.clear();
        self.publish(&inner);
    }
}

/// Mediates between UI intent and the edit buffer.
#[derive(Clone)]
pub struct TodoController {
    shared: Arc<SharedView>,
    ids: Arc<dyn IdSource>,
}

impl TodoController {
    /// Raise a brand new item. Returns the locally generated id the server
    /// will adopt. Rapid successive adds each get a distinct id and a
    /// distinct buffer entry.
    pub fn add_item(&self, text: impl Into<String>) -> ItemId {
        let id = self.ids.next_id();
        self.shared
            .record_add(id.clone(), PendingEdit::new(text, false));
        id
    }

    /// Raise an edit of an existing item; `text: None` encodes deletion.
    /// `completed` is always resent, even when the caller only changed the
    /// text, so the server never has to merge fields.
    pub fn save_item(&self, id: ItemId, text: Option<String>, completed: bool) {
        self.shared.record_save(id, PendingEdit { text, completed });
    }
}

/// Running sync client: background flusher + snapshot feed plus the handles
/// to observe and drive them.
pub struct TodoClient {
    controller: TodoController,
    updates: watch::Receiver<ViewState>,
    feed_states: watch::Receiver<FeedState>,
    visibility: watch::Sender<bool>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl TodoClient {
    pub fn spawn<S, P>(
        config: SyncConfig,
        initial: InitialSnapshot,
        sink: Arc<S>,
        subscriber: P,
        ids: Arc<dyn IdSource>,
    ) -> Self
    where
        S: BatchSink + 'static,
        P: PushSubscriber + 'static,
    {
        let buffer = Arc::new(EditBuffer::new());
        let (shared, updates) = SharedView::new(buffer.clone(), initial);
        let (visibility, visibility_rx) = watch::channel(true);
        let cancel = CancellationToken::new();

        let flusher = Flusher::new(
            buffer,
            shared.clone(),
            sink,
            config.clone(),
            visibility_rx,
            cancel.child_token(),
        );
        let feed = SnapshotFeed::new(subscriber, shared.clone(), config, cancel.child_token());
        let feed_states = feed.states();

        let tasks = vec![tokio::spawn(flusher.run()), tokio::spawn(feed.run())];

        Self {
            controller: TodoController { shared, ids },
            updates,
            feed_states,
            visibility,
            cancel,
            tasks,
        }
    }

    pub fn controller(&self) -> &TodoController {
        &self.controller
    }

    /// Fresh receiver for view state changes.
    pub fn updates(&self) -> watch::Receiver<ViewState> {
        self.updates.clone()
    }

    /// Fresh receiver for push subscription state transitions.
    pub fn feed_states(&self) -> watch::Receiver<FeedState> {
        self.feed_states.clone()
    }

    /// Report whether the embedding view is visible. While hidden, the
    /// flush loop parks and attempts no work.
    pub fn set_visible(&self, visible: bool) {
        self.visibility.send_replace(visible);
    }

    /// Cancel the background loops. Normal embedders never call this, since
    /// the loops live as long as the view, but tests and orderly teardown
    /// need a way out.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the background loops to wind down after [`shutdown`].
    ///
    /// [`shutdown`]: TodoClient::shutdown
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}
