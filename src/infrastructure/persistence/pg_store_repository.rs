//! PostgreSQL implementation of store repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::domain::entities::{NewStore, Store};
use crate::domain::repositories::StoreRepository;
use crate::error::AppError;
use crate::utils::Page;

const STORE_COLUMNS: &str =
    "id, name, display_name, url, comment, creator_id, last_editor_id, registered_at";

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: i64,
    name: String,
    display_name: String,
    url: String,
    comment: Option<String>,
    creator_id: i64,
    last_editor_id: i64,
    registered_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            url: row.url,
            comment: row.comment,
            creator_id: row.creator_id,
            last_editor_id: row.last_editor_id,
            registered_at: row.registered_at,
        }
    }
}

/// PostgreSQL repository for stores.
pub struct PgStoreRepository {
    pool: Arc<PgPool>,
}

impl PgStoreRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    async fn create(&self, new_store: NewStore) -> Result<Store, AppError> {
        let row: StoreRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO stores (name, display_name, url, comment, creator_id, last_editor_id)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(&new_store.name)
        .bind(&new_store.display_name)
        .bind(&new_store.url)
        .bind(&new_store.comment)
        .bind(new_store.creator_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Store>, AppError> {
        let row: Option<StoreRow> =
            sqlx::query_as(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE name = $1"))
                .bind(name)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(row.map(Store::from))
    }

    async fn list(&self, page: Page) -> Result<Vec<Store>, AppError> {
        let rows: Vec<StoreRow> = sqlx::query_as(&format!(
            "SELECT {STORE_COLUMNS} FROM stores ORDER BY registered_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn update(&self, store: Store) -> Result<Store, AppError> {
        let row: Option<StoreRow> = sqlx::query_as(&format!(
            r#"
            UPDATE stores
            SET display_name = $2, url = $3, comment = $4, last_editor_id = $5
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(store.id)
        .bind(&store.display_name)
        .bind(&store.url)
        .bind(&store.comment)
        .bind(store.last_editor_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Store::from)
            .ok_or_else(|| AppError::not_found("Store not found", json!({ "store": store.name })))
    }
}
