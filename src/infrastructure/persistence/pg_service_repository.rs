//! PostgreSQL lookups for the shared service and category tables.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::{Category, Service};
use crate::domain::repositories::{CategoryRepository, ServiceRepository};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    uri: String,
    display_name: Option<String>,
    comment: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    display_name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: Some(row.id),
            name: row.name,
            display_name: row.display_name,
        }
    }
}

/// PostgreSQL repository for services.
pub struct PgServiceRepository {
    pool: Arc<PgPool>,
}

impl PgServiceRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    async fn find_by_uri(&self, uri: &str) -> Result<Option<Service>, AppError> {
        let row: Option<ServiceRow> = sqlx::query_as(
            r#"
            SELECT id, uri, display_name, comment
            FROM services
            WHERE uri = $1
            "#,
        )
        .bind(uri)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let categories: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT c.name
            FROM service_categories sc
            JOIN categories c ON c.id = sc.category_id
            WHERE sc.service_id = $1
            "#,
        )
        .bind(row.id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(Some(Service {
            id: Some(row.id),
            uri: row.uri,
            display_name: row.display_name,
            comment: row.comment,
            categories: categories.into_iter().collect(),
        }))
    }
}

/// PostgreSQL repository for categories.
pub struct PgCategoryRepository {
    pool: Arc<PgPool>,
}

impl PgCategoryRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, name, display_name
            FROM categories
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Category::from))
    }

    async fn list(&self) -> Result<Vec<Category>, AppError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, name, display_name
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }
}
