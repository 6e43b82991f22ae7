use crate::config::DatabaseConfig;
use crate::error::ApiError;
use crate::models::{
    InsertHook, NewNotebook, NewTag, NewUser, Notebook, NotebookChanges, NotebookTag, Tag, UpdateHook,
    User,
};
use crate::schema::TABLES;
use chrono::Utc;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::Row;
use tracing::{error, info};

/// Key for `pg_advisory_xact_lock`, so only one instance migrates at a time.
const MIGRATION_LOCK_ID: i64 = 0x6e6f_7465_626f_6f6b;

const NOTEBOOK_COLUMNS: &str = "id, title, code, description, user_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, email_verified, image";

/// Storage-access layer over a PostgreSQL connection pool.
///
/// Every write goes through the model hooks first: [`InsertHook`] assigns ids
/// and creation timestamps, [`UpdateHook`] refreshes `updated_at`. Constraint
/// enforcement (foreign keys, uniqueness, cascades) is left to PostgreSQL and
/// surfaces as [`ApiError`] through the `From<tokio_postgres::Error>` mapping.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Builds the pool and checks that a connection can actually be made.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, ApiError> {
        info!("Creating PostgreSQL connection pool for host(s): {}", config.display_hosts());

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.test_connection().await?;

        Ok(db)
    }

    fn create_pool(config: &DatabaseConfig) -> Result<Pool, ApiError> {
        let pg_config = config.to_pg_config().map_err(ApiError::Internal)?;

        // TLS is negotiated according to the URL's sslmode; the connector is always available
        let tls_connector = TlsConnector::builder().build().map_err(|e| {
            error!("Failed to create TLS connector: {}", e);
            ApiError::Database(format!("TLS connector creation failed: {}", e))
        })?;
        let tls = MakeTlsConnector::new(tls_connector);

        let manager = Manager::from_config(
            pg_config,
            tls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        Pool::builder(manager)
            .max_size(config.max_connections as usize)
            .wait_timeout(Some(config.connection_timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                ApiError::Database(format!("Connection pool creation failed: {}", e))
            })
    }

    async fn get_connection(&self) -> Result<Object, ApiError> {
        self.pool.get().await.map_err(ApiError::from)
    }

    pub async fn test_connection(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database connection test failed: {}", e);
            ApiError::Database(format!("Connection test failed: {}", e))
        })?;

        info!("Database connection test successful");
        Ok(())
    }

    /// Creates every table in [`TABLES`] plus its indexes, inside one transaction.
    /// Safe to run concurrently from several instances and on every start.
    pub async fn migrate(&self) -> Result<(), ApiError> {
        info!("Running database migrations");

        let mut client = self.get_connection().await?;
        let tx = client.transaction().await?;

        tx.execute("SELECT pg_advisory_xact_lock($1)", &[&MIGRATION_LOCK_ID])
            .await?;

        for table in TABLES {
            tx.batch_execute(&table.create_sql()).await.map_err(|e| {
                error!("Failed to create {} table: {}", table.name, e);
                ApiError::Database(format!("{} table creation failed: {}", table.name, e))
            })?;

            for index in table.index_sql() {
                tx.batch_execute(&index).await.map_err(|e| {
                    error!("Failed to create index on {}: {}", table.name, e);
                    ApiError::Database(format!("{} index creation failed: {}", table.name, e))
                })?;
            }
        }

        tx.commit().await?;

        info!("Database migrations completed successfully ({} tables)", TABLES.len());
        Ok(())
    }

    // User operations

    pub async fn create_user(&self, request: NewUser) -> Result<User, ApiError> {
        let user = request.before_insert(Utc::now());
        let client = self.get_connection().await?;

        let query = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5) RETURNING {cols}",
            cols = USER_COLUMNS
        );
        let row = client
            .query_one(
                &query,
                &[&user.id, &user.name, &user.email, &user.email_verified, &user.image],
            )
            .await?;

        let created = user_from_row(&row);
        info!("Created user with id: {}", created.id);
        Ok(created)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        client
            .query_opt(&query, &[&user_id])
            .await?
            .map(|row| user_from_row(&row))
            .ok_or_else(|| ApiError::not_found(format!("User with id {}", user_id)))
    }

    /// Deleting a user removes their notebooks (and those notebooks' tag links) via cascade.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        let rows_affected = client
            .execute("DELETE FROM users WHERE id = $1", &[&user_id])
            .await?;

        if rows_affected == 0 {
            return Err(ApiError::not_found(format!("User with id {}", user_id)));
        }

        info!("Deleted user with id: {} (notebooks removed by cascade)", user_id);
        Ok(())
    }

    // Notebook operations

    pub async fn create_notebook(&self, request: NewNotebook) -> Result<Notebook, ApiError> {
        request.validate().map_err(ApiError::validation)?;

        let notebook = request.before_insert(Utc::now());
        let client = self.get_connection().await?;

        let query = format!(
            "INSERT INTO notebooks ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {cols}",
            cols = NOTEBOOK_COLUMNS
        );
        let row = client
            .query_one(
                &query,
                &[
                    &notebook.id,
                    &notebook.title,
                    &notebook.code,
                    &notebook.description,
                    &notebook.user_id,
                    &notebook.created_at,
                    &notebook.updated_at,
                ],
            )
            .await?;

        let created = notebook_from_row(&row);
        info!("Created notebook with id: {} for user_id: {}", created.id, created.user_id);
        Ok(created)
    }

    pub async fn get_notebook_by_id(&self, notebook_id: &str) -> Result<Notebook, ApiError> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM notebooks WHERE id = $1", NOTEBOOK_COLUMNS);

        client
            .query_opt(&query, &[&notebook_id])
            .await?
            .map(|row| notebook_from_row(&row))
            .ok_or_else(|| ApiError::not_found(format!("Notebook with id {}", notebook_id)))
    }

    /// Newest first.
    pub async fn get_notebooks_by_user_id(&self, user_id: &str) -> Result<Vec<Notebook>, ApiError> {
        let client = self.get_connection().await?;
        let query = format!(
            "SELECT {} FROM notebooks WHERE user_id = $1 ORDER BY created_at DESC",
            NOTEBOOK_COLUMNS
        );

        let rows = client.query(&query, &[&user_id]).await?;

        Ok(rows.iter().map(notebook_from_row).collect())
    }

    /// Read-modify-write under a row lock so concurrent updates serialize.
    pub async fn update_notebook(
        &self,
        notebook_id: &str,
        changes: NotebookChanges,
    ) -> Result<Notebook, ApiError> {
        changes.validate().map_err(ApiError::validation)?;

        let mut client = self.get_connection().await?;
        let tx = client.transaction().await?;

        let select = format!("SELECT {} FROM notebooks WHERE id = $1 FOR UPDATE", NOTEBOOK_COLUMNS);
        let mut notebook = match tx.query_opt(&select, &[&notebook_id]).await? {
            Some(row) => notebook_from_row(&row),
            None => return Err(ApiError::not_found(format!("Notebook with id {}", notebook_id))),
        };

        notebook.before_update(changes, Utc::now());

        let update = format!(
            "UPDATE notebooks SET title = $1, code = $2, description = $3, updated_at = $4 \
             WHERE id = $5 RETURNING {}",
            NOTEBOOK_COLUMNS
        );
        let row = tx
            .query_one(
                &update,
                &[
                    &notebook.title,
                    &notebook.code,
                    &notebook.description,
                    &notebook.updated_at,
                    &notebook.id,
                ],
            )
            .await?;

        tx.commit().await?;

        let updated = notebook_from_row(&row);
        info!("Updated notebook with id: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_notebook(&self, notebook_id: &str) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        let rows_affected = client
            .execute("DELETE FROM notebooks WHERE id = $1", &[&notebook_id])
            .await?;

        if rows_affected == 0 {
            return Err(ApiError::not_found(format!("Notebook with id {}", notebook_id)));
        }

        info!("Deleted notebook with id: {}", notebook_id);
        Ok(())
    }

    // Tag operations

    pub async fn create_tag(&self, request: NewTag) -> Result<Tag, ApiError> {
        request.validate().map_err(ApiError::validation)?;

        let tag = request.before_insert(Utc::now());
        let client = self.get_connection().await?;

        let row = client
            .query_one(
                "INSERT INTO tags (id, name) VALUES ($1, $2) RETURNING id, name",
                &[&tag.id, &tag.name],
            )
            .await?;

        let created = tag_from_row(&row);
        info!("Created tag '{}' with id: {}", created.name, created.id);
        Ok(created)
    }

    pub async fn get_tag_by_id(&self, tag_id: &str) -> Result<Tag, ApiError> {
        let client = self.get_connection().await?;

        client
            .query_opt("SELECT id, name FROM tags WHERE id = $1", &[&tag_id])
            .await?
            .map(|row| tag_from_row(&row))
            .ok_or_else(|| ApiError::not_found(format!("Tag with id {}", tag_id)))
    }

    pub async fn delete_tag(&self, tag_id: &str) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        let rows_affected = client
            .execute("DELETE FROM tags WHERE id = $1", &[&tag_id])
            .await?;

        if rows_affected == 0 {
            return Err(ApiError::not_found(format!("Tag with id {}", tag_id)));
        }

        info!("Deleted tag with id: {}", tag_id);
        Ok(())
    }

    // Notebook <-> tag links

    /// Fails with `Validation` when either side is missing and `Conflict` when already linked.
    pub async fn add_tag_to_notebook(
        &self,
        notebook_id: &str,
        tag_id: &str,
    ) -> Result<NotebookTag, ApiError> {
        let client = self.get_connection().await?;

        let row = client
            .query_one(
                "INSERT INTO notebook_tags (notebook_id, tag_id) VALUES ($1, $2) \
                 RETURNING notebook_id, tag_id",
                &[&notebook_id, &tag_id],
            )
            .await?;

        info!("Tagged notebook {} with tag {}", notebook_id, tag_id);
        Ok(notebook_tag_from_row(&row))
    }

    pub async fn remove_tag_from_notebook(&self, notebook_id: &str, tag_id: &str) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        let rows_affected = client
            .execute(
                "DELETE FROM notebook_tags WHERE notebook_id = $1 AND tag_id = $2",
                &[&notebook_id, &tag_id],
            )
            .await?;

        if rows_affected == 0 {
            return Err(ApiError::not_found(format!(
                "Tag {} on notebook {}",
                tag_id, notebook_id
            )));
        }

        Ok(())
    }

    /// Tags attached to a notebook, ordered by name.
    pub async fn get_tags_for_notebook(&self, notebook_id: &str) -> Result<Vec<Tag>, ApiError> {
        let client = self.get_connection().await?;

        let rows = client
            .query(
                "SELECT t.id, t.name FROM tags t \
                 JOIN notebook_tags nt ON nt.tag_id = t.id \
                 WHERE nt.notebook_id = $1 ORDER BY t.name",
                &[&notebook_id],
            )
            .await?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Raw join rows pointing at a tag.
    pub async fn get_links_for_tag(&self, tag_id: &str) -> Result<Vec<NotebookTag>, ApiError> {
        let client = self.get_connection().await?;

        let rows = client
            .query(
                "SELECT notebook_id, tag_id FROM notebook_tags WHERE tag_id = $1 ORDER BY notebook_id",
                &[&tag_id],
            )
            .await?;

        Ok(rows.iter().map(notebook_tag_from_row).collect())
    }

    /// Raw join rows pointing at a notebook.
    pub async fn get_links_for_notebook(&self, notebook_id: &str) -> Result<Vec<NotebookTag>, ApiError> {
        let client = self.get_connection().await?;

        let rows = client
            .query(
                "SELECT notebook_id, tag_id FROM notebook_tags WHERE notebook_id = $1 ORDER BY tag_id",
                &[&notebook_id],
            )
            .await?;

        Ok(rows.iter().map(notebook_tag_from_row).collect())
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        email_verified: row.get("email_verified"),
        image: row.get("image"),
    }
}

fn notebook_from_row(row: &Row) -> Notebook {
    Notebook {
        id: row.get("id"),
        title: row.get("title"),
        code: row.get("code"),
        description: row.get("description"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn tag_from_row(row: &Row) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
    }
}

fn notebook_tag_from_row(row: &Row) -> NotebookTag {
    NotebookTag {
        notebook_id: row.get("notebook_id"),
        tag_id: row.get("tag_id"),
    }
}
