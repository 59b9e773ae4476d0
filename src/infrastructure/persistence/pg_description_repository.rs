//! PostgreSQL implementation of description repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::pg_catalog_transaction::PgCatalogTransaction;
use super::pg_offering_repository::{OFFERING_COLUMNS, OfferingRow, hydrate_offerings};
use crate::domain::entities::Description;
use crate::domain::repositories::{CatalogTransaction, DescriptionRepository};
use crate::error::AppError;
use crate::utils::Page;

const DESCRIPTION_COLUMNS: &str = "d.id, d.store_id, d.name, d.display_name, d.url, d.comment, \
     d.creator_id, d.last_editor_id, d.registered_at";

#[derive(sqlx::FromRow)]
struct DescriptionRow {
    id: i64,
    store_id: i64,
    name: String,
    display_name: String,
    url: String,
    comment: Option<String>,
    creator_id: i64,
    last_editor_id: i64,
    registered_at: DateTime<Utc>,
}

impl From<DescriptionRow> for Description {
    fn from(row: DescriptionRow) -> Self {
        Description {
            id: Some(row.id),
            store_id: row.store_id,
            name: row.name,
            display_name: row.display_name,
            url: row.url,
            comment: row.comment,
            creator_id: row.creator_id,
            last_editor_id: row.last_editor_id,
            registered_at: row.registered_at,
            offerings: Vec::new(),
        }
    }
}

/// PostgreSQL repository for descriptions.
///
/// Descriptions are returned with their offerings in document order.
pub struct PgDescriptionRepository {
    pool: Arc<PgPool>,
}

impl PgDescriptionRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DescriptionRepository for PgDescriptionRepository {
    async fn find_by_name_and_store(
        &self,
        store_name: &str,
        name: &str,
    ) -> Result<Option<Description>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<DescriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {DESCRIPTION_COLUMNS}
            FROM descriptions d
            JOIN stores s ON s.id = d.store_id
            WHERE s.name = $1 AND d.name = $2
            "#
        ))
        .bind(store_name)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let offering_rows: Vec<OfferingRow> = sqlx::query_as(&format!(
            "SELECT {OFFERING_COLUMNS} FROM offerings o WHERE o.description_id = $1 ORDER BY o.position"
        ))
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        let mut description = Description::from(row);
        description.offerings = hydrate_offerings(&mut conn, offering_rows).await?;
        Ok(Some(description))
    }

    async fn list_by_store(
        &self,
        store_id: i64,
        page: Page,
    ) -> Result<Vec<Description>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<DescriptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {DESCRIPTION_COLUMNS}
            FROM descriptions d
            WHERE d.store_id = $1
            ORDER BY d.registered_at, d.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(store_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *conn)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let offering_rows: Vec<OfferingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {OFFERING_COLUMNS}
            FROM offerings o
            WHERE o.description_id = ANY($1)
            ORDER BY o.description_id, o.position
            "#
        ))
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut by_description: HashMap<i64, Vec<_>> = HashMap::new();
        for offering in hydrate_offerings(&mut conn, offering_rows).await? {
            if let Some(description_id) = offering.described_in {
                by_description.entry(description_id).or_default().push(offering);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                let mut description = Description::from(row);
                description.offerings = by_description.remove(&id).unwrap_or_default();
                description
            })
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgCatalogTransaction::new(tx)))
    }
}
