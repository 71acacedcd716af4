use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{CollectionPath, Document, DocumentStore, Fields, OrderBy, StoreError, apply_order};

/// Documents kept as JSON text in a single `documents` table keyed by
/// `(collection, key)`.
#[derive(Clone, Debug)]
pub struct SqliteDocumentStore {
    db: SqlitePool,
}

impl SqliteDocumentStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::from_pool(db).await
    }

    /// Single-connection in-memory database; every connection to
    /// `:memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(db).await
    }

    pub async fn from_pool(db: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self { db })
    }

    async fn upsert(&self, collection: &CollectionPath, key: &str, fields: &Fields) -> Result<(), StoreError> {
        let body = serde_json::to_string(fields).map_err(|e| StoreError::Malformed(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO documents (collection, key, fields, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (collection, key) DO UPDATE SET fields = excluded.fields, updated_at = excluded.updated_at",
        )
        .bind(collection.as_str())
        .bind(key)
        .bind(body)
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

fn decode_fields(raw: &str) -> Result<Fields, StoreError> {
    serde_json::from_str::<Fields>(raw).map_err(|e| StoreError::Malformed(e.to_string()))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_all(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query("SELECT key, fields FROM documents WHERE collection = ? ORDER BY seq")
            .bind(collection.as_str())
            .fetch_all(&self.db)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("key")?;
            let raw: String = row.try_get("fields")?;
            match decode_fields(&raw) {
                Ok(fields) => docs.push(Document { key, fields }),
                Err(e) => tracing::warn!("Skipping document {}/{}: {}", collection, key, e),
            }
        }

        Ok(match order {
            Some(order) => apply_order(docs, order),
            None => docs,
        })
    }

    async fn get_one(&self, collection: &CollectionPath, key: &str) -> Result<Option<Fields>, StoreError> {
        let raw: Option<String> = sqlx::query_scalar("SELECT fields FROM documents WHERE collection = ? AND key = ?")
            .bind(collection.as_str())
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        raw.as_deref().map(decode_fields).transpose()
    }

    async fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        let key = Uuid::new_v4().simple().to_string();
        self.upsert(collection, &key, &fields).await?;
        Ok(key)
    }

    async fn merge_update(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        let now = Utc::now().to_rfc3339();

        // Write first so the transaction holds the write lock before it reads.
        sqlx::query(
            "INSERT INTO documents (collection, key, fields, updated_at) VALUES (?, ?, '{}', ?)
             ON CONFLICT (collection, key) DO UPDATE SET updated_at = excluded.updated_at",
        )
        .bind(collection.as_str())
        .bind(key)
        .bind(now.as_str())
        .execute(&mut *tx)
        .await?;

        let existing: Option<String> = sqlx::query_scalar("SELECT fields FROM documents WHERE collection = ? AND key = ?")
            .bind(collection.as_str())
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        let mut merged = match existing {
            Some(raw) => decode_fields(&raw)?,
            None => Fields::new(),
        };
        merged.extend(fields);

        let body = serde_json::to_string(&merged).map_err(|e| StoreError::Malformed(e.to_string()))?;
        sqlx::query(
            "INSERT INTO documents (collection, key, fields, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (collection, key) DO UPDATE SET fields = excluded.fields, updated_at = excluded.updated_at",
        )
        .bind(collection.as_str())
        .bind(key)
        .bind(body)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn overwrite(&self, collection: &CollectionPath, key: &str, fields: Fields) -> Result<(), StoreError> {
        self.upsert(collection, key, &fields).await
    }

    async fn delete(&self, collection: &CollectionPath, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND key = ?")
            .bind(collection.as_str())
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }
}
