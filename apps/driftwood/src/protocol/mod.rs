//! Wire types exchanged with the list server.
//!
//! The REST surface accepts a JSON array of [`BatchEntry`] records; the push
//! channel delivers full list snapshots as a JSON array of
//! [`TodoItem`](crate::model::TodoItem). Snapshots replace local state
//! wholesale, so there is no patch or delta format to negotiate.

use serde::{Deserialize, Serialize};

use crate::model::{ItemId, PendingEdit, TodoItem};

/// One mutation as submitted to the server. `text: null` requests deletion;
/// any other value upserts the item with the given text and completion
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub id: ItemId,
    pub text: Option<String>,
    pub completed: bool,
}

impl BatchEntry {
    pub fn from_edit(id: ItemId, edit: PendingEdit) -> Self {
        Self {
            id,
            text: edit.text,
            completed: edit.completed,
        }
    }
}

/// Parse a push payload as a full list snapshot.
pub fn parse_snapshot(payload: &str) -> Result<Vec<TodoItem>, serde_json::Error> {
    serde_json::from_str(payload)
}
