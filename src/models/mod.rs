// Models module

pub mod notebook;
pub mod tag;
pub mod user;

use chrono::{DateTime, Utc};

// Re-export commonly used types
pub use notebook::{NewNotebook, Notebook, NotebookChanges};
pub use tag::{NewTag, NotebookTag, Tag};
pub use user::{NewUser, User};

/// Runs right before a row is inserted.
/// Turns the caller's draft into the row that gets written: generates the
/// id when none was supplied and stamps creation timestamps with `now`.
pub trait InsertHook {
    type Row;

    fn before_insert(self, now: DateTime<Utc>) -> Self::Row;
}

/// Runs right before a row is updated.
/// Applies `changes` and refreshes `updated_at`; identity and creation time stay fixed.
pub trait UpdateHook {
    type Changes;

    fn before_update(&mut self, changes: Self::Changes, now: DateTime<Utc>);
}

/// Id for a new row: the caller's value when given, a random UUID otherwise.
pub(crate) fn assign_id(supplied: Option<String>) -> String {
    supplied
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
