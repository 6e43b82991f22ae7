use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{assign_id, InsertHook};

/// Account owned by the external auth flow.
/// Only the id matters to notebooks; the other columns mirror what the auth adapter stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl NewUser {
    pub fn with_email(email: impl Into<String>) -> Self {
        NewUser {
            email: Some(email.into()),
            ..Default::default()
        }
    }
}

impl InsertHook for NewUser {
    type Row = User;

    fn before_insert(self, _now: DateTime<Utc>) -> User {
        User {
            id: assign_id(self.id),
            name: self.name,
            email: self.email,
            email_verified: None,
            image: self.image,
        }
    }
}
