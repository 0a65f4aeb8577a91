use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Opaque unique identifier for one list item. Generated client-side so
/// optimistic edits can reference an item before the server has seen it.
pub type ItemId = String;

/// One entry of the canonical list as the server last reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: ItemId,
    pub text: String,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Opaque per-revision token. Used only as a render-identity hint;
    /// never interpreted.
    pub versionstamp: String,
}

/// An unconfirmed local change to one item, coalesced per item id.
///
/// `text: None` marks the item for deletion. Both fields are always carried
/// together: a newer edit replaces the previous one wholesale rather than
/// merging field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub text: Option<String>,
    pub completed: bool,
}

impl PendingEdit {
    pub fn new(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: Some(text.into()),
            completed,
        }
    }

    pub fn delete(completed: bool) -> Self {
        Self {
            text: None,
            completed,
        }
    }

    /// Whether this edit asks the server to remove the item.
    pub fn is_delete(&self) -> bool {
        self.text.is_none()
    }
}
