use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{assign_id, InsertHook, UpdateHook};

/// A stored code snippet with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    pub code: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft of a notebook before insertion. `id` is normally left empty.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNotebook {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub code: String,
    pub description: Option<String>,
    pub user_id: String,
}

/// Partial update. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookChanges {
    pub title: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    Ok(())
}

impl NewNotebook {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, code: impl Into<String>) -> Self {
        NewNotebook {
            id: None,
            title: title.into(),
            code: code.into(),
            description: None,
            user_id: user_id.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("User ID cannot be empty".to_string());
        }

        validate_title(&self.title)?;

        Ok(())
    }
}

impl InsertHook for NewNotebook {
    type Row = Notebook;

    fn before_insert(self, now: DateTime<Utc>) -> Notebook {
        Notebook {
            id: assign_id(self.id),
            title: self.title,
            code: self.code,
            description: self.description,
            user_id: self.user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl NotebookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.code.is_none() && self.description.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err(
                "At least one field (title, code or description) must be provided for update".to_string(),
            );
        }

        if let Some(ref title) = self.title {
            validate_title(title)?;
        }

        Ok(())
    }
}

impl UpdateHook for Notebook {
    type Changes = NotebookChanges;

    fn before_update(&mut self, changes: NotebookChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }

        if let Some(code) = changes.code {
            self.code = code;
        }

        if let Some(description) = changes.description {
            self.description = description;
        }

        // A clock that steps backwards must not move updated_at before created_at
        self.updated_at = now.max(self.created_at);
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn instant(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_insert_hook_generates_id_and_timestamps() {
        let draft = NewNotebook::new("user-1", "Quick sort", "fn main() {}")
            .with_description("sorting demo");

        let notebook = draft.before_insert(instant(0));

        assert!(Uuid::parse_str(&notebook.id).is_ok());
        assert_eq!(notebook.title, "Quick sort");
        assert_eq!(notebook.code, "fn main() {}");
        assert_eq!(notebook.description, Some("sorting demo".to_string()));
        assert_eq!(notebook.user_id, "user-1");
        assert_eq!(notebook.created_at, instant(0));
        assert_eq!(notebook.updated_at, instant(0));
    }

    #[test]
    fn test_insert_hook_stores_values_as_given() {
        let notebook = NewNotebook::new("user-1", "  Quick sort  ", "  fn main() {}\n")
            .with_description("")
            .before_insert(instant(0));

        assert_eq!(notebook.title, "  Quick sort  ");
        assert_eq!(notebook.code, "  fn main() {}\n");
        assert_eq!(notebook.description, Some(String::new()));
    }

    #[test]
    fn test_update_hook_stores_values_as_given() {
        let mut notebook = NewNotebook::new("user-1", "Title", "code").before_insert(instant(0));

        notebook.before_update(
            NotebookChanges {
                title: Some(" Renamed ".to_string()),
                description: Some(Some("  ".to_string())),
                ..Default::default()
            },
            instant(1),
        );

        assert_eq!(notebook.title, " Renamed ");
        assert_eq!(notebook.description, Some("  ".to_string()));
    }

    #[test]
    fn test_insert_hook_keeps_supplied_id() {
        let mut draft = NewNotebook::new("user-1", "Title", "print(1)");
        draft.id = Some("fixed-id".to_string());

        assert_eq!(draft.before_insert(instant(0)).id, "fixed-id");
    }

    #[test]
    fn test_insert_hook_ids_are_unique() {
        let a = NewNotebook::new("user-1", "A", "a").before_insert(instant(0));
        let b = NewNotebook::new("user-1", "B", "b").before_insert(instant(0));

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_update_hook_refreshes_updated_at_only() {
        let mut notebook = NewNotebook::new("user-1", "Title", "old").before_insert(instant(0));
        let id = notebook.id.clone();

        notebook.before_update(
            NotebookChanges {
                code: Some("new".to_string()),
                ..Default::default()
            },
            instant(60),
        );

        assert_eq!(notebook.id, id);
        assert_eq!(notebook.user_id, "user-1");
        assert_eq!(notebook.code, "new");
        assert_eq!(notebook.title, "Title");
        assert_eq!(notebook.created_at, instant(0));
        assert_eq!(notebook.updated_at, instant(60));
    }

    #[test]
    fn test_update_hook_clears_description() {
        let mut notebook = NewNotebook::new("user-1", "Title", "code")
            .with_description("desc")
            .before_insert(instant(0));

        notebook.before_update(
            NotebookChanges {
                description: Some(None),
                ..Default::default()
            },
            instant(1),
        );

        assert_eq!(notebook.description, None);
    }

    #[test]
    fn test_update_hook_never_precedes_creation() {
        let mut notebook = NewNotebook::new("user-1", "Title", "code").before_insert(instant(100));

        notebook.before_update(
            NotebookChanges {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
            instant(100) - Duration::seconds(5),
        );

        assert_eq!(notebook.updated_at, notebook.created_at);
    }

    #[test]
    fn test_new_notebook_validation() {
        assert!(NewNotebook::new("user-1", "Title", "").validate().is_ok());
        assert!(NewNotebook::new("", "Title", "code").validate().is_err());
        assert!(NewNotebook::new("user-1", "   ", "code").validate().is_err());
    }

    #[test]
    fn test_long_title_is_accepted() {
        let title = "a".repeat(201);
        let draft = NewNotebook::new("user-1", title.clone(), "code");

        assert!(draft.validate().is_ok());
        assert_eq!(draft.before_insert(instant(0)).title, title);

        let rename = NotebookChanges {
            title: Some("b".repeat(5000)),
            ..Default::default()
        };
        assert!(rename.validate().is_ok());
    }

    #[test]
    fn test_changes_validation() {
        assert!(NotebookChanges::default().validate().is_err());

        let blank_title = NotebookChanges {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(blank_title.validate().is_err());

        let clear_description = NotebookChanges {
            description: Some(None),
            ..Default::default()
        };
        assert!(clear_description.validate().is_ok());
    }

    #[test]
    fn test_changes_deserialization() {
        let absent: NotebookChanges = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert_eq!(absent.description, None);

        let null: NotebookChanges = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(null.description, Some(None));

        let set: NotebookChanges = serde_json::from_str(r#"{"description":"d"}"#).unwrap();
        assert_eq!(set.description, Some(Some("d".to_string())));
    }

    #[test]
    fn test_notebook_serialization() {
        let notebook = Notebook {
            id: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            title: "Hello".to_string(),
            code: "print('hi')".to_string(),
            description: None,
            user_id: "user-1".to_string(),
            created_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc),
        };

        let json = serde_json::to_string(&notebook).expect("Failed to serialize notebook");
        let expected = r#"{"id":"123e4567-e89b-12d3-a456-426614174000","title":"Hello","code":"print('hi')","description":null,"user_id":"user-1","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}"#;
        assert_eq!(json, expected);
    }
}
