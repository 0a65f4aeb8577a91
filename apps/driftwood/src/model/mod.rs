mod todo;

pub use todo::{ItemId, PendingEdit, TodoItem};
