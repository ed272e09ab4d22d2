use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use super::{Document, DocumentStore, Fields};
use crate::error::{StoreError, StoreResult};

/// Document store backed by a single `documents` table with a JSONB payload.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, (String, Json<Fields>)>(
            r#"
            SELECT key, fields
              FROM documents
             WHERE collection = $1
             ORDER BY key ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, collection, "get_all failed");
            StoreError::from(e)
        })?;

        Ok(rows
            .into_iter()
            .map(|(key, Json(fields))| Document { key, fields })
            .collect())
    }

    async fn get_one(&self, collection: &str, key: &str) -> StoreResult<Option<Fields>> {
        let row = sqlx::query_as::<_, (Json<Fields>,)>(
            r#"
            SELECT fields
              FROM documents
             WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|(Json(fields),)| fields))
    }

    async fn set_one(&self, collection: &str, key: &str, fields: Fields) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, fields)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO UPDATE SET fields = EXCLUDED.fields
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(Json(fields))
        .execute(&self.db)
        .await?;
        debug!(collection, key, "document set");
        Ok(())
    }

    async fn update_fields(&self, collection: &str, key: &str, fields: Fields) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents
               SET fields = fields || $3
             WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(Json(fields))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, key));
        }
        debug!(collection, key, "document updated");
        Ok(())
    }

    async fn union_append(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        value: Value,
    ) -> StoreResult<()> {
        // Non-array values are replaced by a one-element array.
        let result = sqlx::query(
            r#"
            UPDATE documents
               SET fields = jsonb_set(
                       fields,
                       ARRAY[$3::text],
                       CASE
                           WHEN jsonb_typeof(fields -> $3::text) <> 'array'
                                OR fields -> $3::text IS NULL
                               THEN jsonb_build_array($4::jsonb)
                           WHEN (fields -> $3::text) @> jsonb_build_array($4::jsonb)
                               THEN fields -> $3::text
                           ELSE (fields -> $3::text) || jsonb_build_array($4::jsonb)
                       END,
                       true)
             WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(field)
        .bind(Json(value))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, key));
        }
        debug!(collection, key, field, "array union applied");
        Ok(())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let key = Uuid::new_v4().simple().to_string();
        self.set_one(collection, &key, fields).await?;
        Ok(key)
    }
}
