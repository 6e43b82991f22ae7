use serde::{Deserialize, Serialize};

use super::{assign_id, InsertHook};
use chrono::{DateTime, Utc};

/// Label shared across notebooks. Names are unique across the whole table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Row of the `notebook_tags` join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookTag {
    pub notebook_id: String,
    pub tag_id: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        NewTag {
            id: None,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Tag name cannot be empty".to_string());
        }

        Ok(())
    }
}

impl InsertHook for NewTag {
    type Row = Tag;

    // Tags carry no timestamps
    fn before_insert(self, _now: DateTime<Utc>) -> Tag {
        Tag {
            id: assign_id(self.id),
            name: self.name,
        }
    }
}
