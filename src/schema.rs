//! Relational schema.
//!
//! Every table is declared as static data: its columns, primary key,
//! foreign keys with their delete rule, and extra indexes. The declarations
//! are rendered to PostgreSQL DDL by [`Table::create_sql`] and applied by
//! [`crate::db::Database::migrate`] in the order of [`TABLES`], which lists
//! referenced tables before the tables that point at them.
//!
//! `users`, `accounts`, `sessions` and `verification_tokens` belong to the
//! external auth flow. They are created here so the notebook foreign keys
//! have something to reference, but nothing in this crate writes to the
//! last three.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    TimestampTz,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::TimestampTz => "TIMESTAMPTZ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub unique: bool,
}

impl Column {
    pub const fn required(name: &'static str, sql_type: SqlType) -> Self {
        Column { name, sql_type, nullable: false, unique: false }
    }

    pub const fn optional(name: &'static str, sql_type: SqlType) -> Self {
        Column { name, sql_type, nullable: true, unique: false }
    }

    pub const fn unique(self) -> Self {
        Column { unique: true, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    Restrict,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
    pub referenced_column: &'static str,
    pub on_delete: OnDelete,
}

impl ForeignKey {
    /// Constraint name, following PostgreSQL's `<table>_<column>_fkey` default.
    pub fn constraint_name(&self, table: &str) -> String {
        format!("{}_{}_fkey", table, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
    pub indexes: &'static [Index],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_name(&self) -> String {
        format!("{}_pkey", self.name)
    }

    /// Renders `CREATE TABLE IF NOT EXISTS` with all constraints named explicitly.
    pub fn create_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut line = format!("{} {}", column.name, column.sql_type.as_sql());
                if !column.nullable {
                    line.push_str(" NOT NULL");
                }
                if column.unique {
                    let _ = write!(line, " CONSTRAINT {}_{}_key UNIQUE", self.name, column.name);
                }
                line
            })
            .collect();

        lines.push(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            self.primary_key_name(),
            self.primary_key.join(", ")
        ));

        for fk in self.foreign_keys {
            lines.push(format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {}",
                fk.constraint_name(self.name),
                fk.column,
                fk.references,
                fk.referenced_column,
                fk.on_delete.as_sql()
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            lines.join(",\n    ")
        )
    }

    pub fn index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                    index.name,
                    self.name,
                    index.columns.join(", ")
                )
            })
            .collect()
    }
}

pub const USERS: Table = Table {
    name: "users",
    columns: &[
        Column::required("id", SqlType::Text),
        Column::optional("name", SqlType::Text),
        Column::optional("email", SqlType::Text).unique(),
        Column::optional("email_verified", SqlType::TimestampTz),
        Column::optional("image", SqlType::Text),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    indexes: &[],
};

pub const ACCOUNTS: Table = Table {
    name: "accounts",
    columns: &[
        Column::required("user_id", SqlType::Text),
        Column::required("type", SqlType::Text),
        Column::required("provider", SqlType::Text),
        Column::required("provider_account_id", SqlType::Text),
        Column::optional("refresh_token", SqlType::Text),
        Column::optional("access_token", SqlType::Text),
        Column::optional("expires_at", SqlType::Integer),
        Column::optional("token_type", SqlType::Text),
        Column::optional("scope", SqlType::Text),
        Column::optional("id_token", SqlType::Text),
        Column::optional("session_state", SqlType::Text),
    ],
    primary_key: &["provider", "provider_account_id"],
    foreign_keys: &[ForeignKey {
        column: "user_id",
        references: "users",
        referenced_column: "id",
        on_delete: OnDelete::Cascade,
    }],
    indexes: &[],
};

pub const SESSIONS: Table = Table {
    name: "sessions",
    columns: &[
        Column::required("session_token", SqlType::Text),
        Column::required("user_id", SqlType::Text),
        Column::required("expires", SqlType::TimestampTz),
    ],
    primary_key: &["session_token"],
    foreign_keys: &[ForeignKey {
        column: "user_id",
        references: "users",
        referenced_column: "id",
        on_delete: OnDelete::Cascade,
    }],
    indexes: &[],
};

pub const VERIFICATION_TOKENS: Table = Table {
    name: "verification_tokens",
    columns: &[
        Column::required("identifier", SqlType::Text),
        Column::required("token", SqlType::Text),
        Column::required("expires", SqlType::TimestampTz),
    ],
    primary_key: &["identifier", "token"],
    foreign_keys: &[],
    indexes: &[],
};

pub const NOTEBOOKS: Table = Table {
    name: "notebooks",
    columns: &[
        Column::required("id", SqlType::Text),
        Column::required("title", SqlType::Text),
        Column::required("code", SqlType::Text),
        Column::optional("description", SqlType::Text),
        Column::required("user_id", SqlType::Text),
        Column::required("created_at", SqlType::TimestampTz),
        Column::required("updated_at", SqlType::TimestampTz),
    ],
    primary_key: &["id"],
    foreign_keys: &[ForeignKey {
        column: "user_id",
        references: "users",
        referenced_column: "id",
        on_delete: OnDelete::Cascade,
    }],
    indexes: &[Index {
        name: "idx_notebooks_user_id",
        columns: &["user_id"],
    }],
};

pub const TAGS: Table = Table {
    name: "tags",
    columns: &[
        Column::required("id", SqlType::Text),
        Column::required("name", SqlType::Text).unique(),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    indexes: &[],
};

pub const NOTEBOOK_TAGS: Table = Table {
    name: "notebook_tags",
    columns: &[
        Column::required("notebook_id", SqlType::Text),
        Column::required("tag_id", SqlType::Text),
    ],
    primary_key: &["notebook_id", "tag_id"],
    foreign_keys: &[
        ForeignKey {
            column: "notebook_id",
            references: "notebooks",
            referenced_column: "id",
            on_delete: OnDelete::Cascade,
        },
        ForeignKey {
            column: "tag_id",
            references: "tags",
            referenced_column: "id",
            on_delete: OnDelete::Cascade,
        },
    ],
    indexes: &[],
};

/// All tables, referenced tables first.
pub const TABLES: &[Table] = &[
    USERS,
    ACCOUNTS,
    SESSIONS,
    VERIFICATION_TOKENS,
    NOTEBOOKS,
    TAGS,
    NOTEBOOK_TAGS,
];
