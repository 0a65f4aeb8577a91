use std::collections::HashMap;
use std::mem;

use parking_lot::Mutex;

use crate::model::{ItemId, PendingEdit};

/// Coalescing buffer of unconfirmed edits, at most one per item id.
///
/// A newer edit for an id overwrites the previous one wholesale. Draining
/// exchanges the entire buffer for an empty one in a single step: edits
/// recorded before the exchange are in the drained set, edits recorded after
/// it wait for the next drain. Nothing is ever lost in between, and nothing
/// drained can show up twice.
#[derive(Debug, Default)]
pub struct EditBuffer {
    inner: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    edits: HashMap<ItemId, PendingEdit>,
    order: Vec<ItemId>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the pending edit for `id`.
    pub fn record(&self, id: ItemId, edit: PendingEdit) {
        let mut inner = self.inner.lock();
        if inner.edits.insert(id.clone(), edit).is_none() {
            inner.order.push(id);
        }
    }

    /// Exchange the buffer with an empty one, returning the prior entries in
    /// first-recorded order.
    pub fn drain_all(&self) -> Vec<(ItemId, PendingEdit)> {
        let taken = mem::take(&mut *self.inner.lock());
        let Entries { mut edits, order } = taken;
        order
            .into_iter()
            .filter_map(|id| edits.remove(&id).map(|edit| (id, edit)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().edits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_edit_for_same_id_overwrites() {
        let buffer = EditBuffer::new();
        buffer.record("x".into(), PendingEdit::new("first", true));
        buffer.record("x".into(), PendingEdit::delete(true));

        assert_eq!(buffer.len(), 1);
        let drained = buffer.drain_all();
        assert_eq!(drained, vec![("x".to_string(), PendingEdit::delete(true))]);
    }

    #[test]
    fn drain_empties_the_buffer() {
        let buffer = EditBuffer::new();
        buffer.record("a".into(), PendingEdit::new("one", false));

        assert_eq!(buffer.drain_all().len(), 1);
        assert!(buffer.is_empty());
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn edits_recorded_after_a_drain_wait_for_the_next_one() {
        let buffer = EditBuffer::new();
        buffer.record("a".into(), PendingEdit::new("one", false));
        let first = buffer.drain_all();
        buffer.record("b".into(), PendingEdit::new("two", false));
        let second = buffer.drain_all();

        assert_eq!(first[0].0, "a");
        assert_eq!(second[0].0, "b");
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn drain_preserves_first_recorded_order() {
        let buffer = EditBuffer::new();
        for i in 0..20 {
            buffer.record(format!("id-{i:02}"), PendingEdit::new(format!("t{i}"), false));
        }
        // Overwriting an entry must not move it to the back.
        buffer.record("id-03".into(), PendingEdit::new("rewritten", true));

        let ids: Vec<_> = buffer.drain_all().into_iter().map(|(id, _)| id).collect();
        let expected: Vec<_> = (0..20).map(|i| format!("id-{i:02}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn delete_marker_passes_through_unchanged() {
        let buffer = EditBuffer::new();
        buffer.record("x".into(), PendingEdit::delete(false));

        let drained = buffer.drain_all();
        assert!(drained[0].1.is_delete());
        assert!(!drained[0].1.completed);
    }
}
