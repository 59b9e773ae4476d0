//! PostgreSQL unit of work for catalog writes.

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgConnection, Postgres, Transaction};
use tracing::debug;

use super::pg_offering_repository::{OFFERING_COLUMNS, OfferingRow, hydrate_offerings};
use crate::domain::entities::{Category, Description, Offering, Service};
use crate::domain::repositories::CatalogTransaction;
use crate::error::AppError;

/// A catalog write transaction backed by one PostgreSQL transaction.
///
/// Dropping it without calling [`CatalogTransaction::commit`] rolls the
/// database transaction back.
pub struct PgCatalogTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgCatalogTransaction {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }

    fn conn(&mut self) -> Result<&mut PgConnection, AppError> {
        self.tx.as_deref_mut().ok_or_else(finished)
    }

    async fn load_offerings(
        &mut self,
        filter: &str,
        id: i64,
    ) -> Result<Vec<Offering>, AppError> {
        let conn = self.conn()?;

        let rows: Vec<OfferingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {OFFERING_COLUMNS}
            FROM offerings o
            JOIN descriptions d ON d.id = o.description_id
            WHERE {filter} = $1
            ORDER BY d.id, o.position
            "#
        ))
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        hydrate_offerings(conn, rows).await
    }
}

fn finished() -> AppError {
    AppError::internal("Catalog transaction already finished", json!({}))
}

async fn write_offering(
    conn: &mut PgConnection,
    description_id: i64,
    position: i32,
    offering: &Offering,
) -> Result<i64, AppError> {
    let offering_id: i64 = match offering.id {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE offerings
                SET description_id = $2, position = $3, name = $4, display_name = $5,
                    description = $6, version = $7, image_url = $8
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(description_id)
            .bind(position)
            .bind(&offering.name)
            .bind(&offering.display_name)
            .bind(&offering.description)
            .bind(&offering.version)
            .bind(&offering.image_url)
            .execute(&mut *conn)
            .await?;
            id
        }
        None => {
            sqlx::query_scalar(
                r#"
                INSERT INTO offerings
                    (description_id, position, uri, name, display_name, description, version, image_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id
                "#,
            )
            .bind(description_id)
            .bind(position)
            .bind(&offering.uri)
            .bind(&offering.name)
            .bind(&offering.display_name)
            .bind(&offering.description)
            .bind(&offering.version)
            .bind(&offering.image_url)
            .fetch_one(&mut *conn)
            .await?
        }
    };

    let services: Vec<String> = offering.services.iter().cloned().collect();
    sqlx::query("DELETE FROM offering_services WHERE offering_id = $1")
        .bind(offering_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO offering_services (offering_id, service_id)
        SELECT $1, id FROM services WHERE uri = ANY($2)
        "#,
    )
    .bind(offering_id)
    .bind(&services)
    .execute(&mut *conn)
    .await?;

    let categories: Vec<String> = offering.categories.iter().cloned().collect();
    sqlx::query("DELETE FROM offering_categories WHERE offering_id = $1")
        .bind(offering_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO offering_categories (offering_id, category_id)
        SELECT $1, id FROM categories WHERE name = ANY($2)
        "#,
    )
    .bind(offering_id)
    .bind(&categories)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM price_plans WHERE offering_id = $1")
        .bind(offering_id)
        .execute(&mut *conn)
        .await?;

    for (plan_position, plan) in offering.price_plans.iter().enumerate() {
        let plan_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO price_plans (offering_id, position, title, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(offering_id)
        .bind(plan_position as i32)
        .bind(&plan.title)
        .bind(&plan.comment)
        .fetch_one(&mut *conn)
        .await?;

        for (component_position, component) in plan.components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO price_components
                    (price_plan_id, position, title, comment, currency, unit, value)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(plan_id)
            .bind(component_position as i32)
            .bind(&component.title)
            .bind(&component.comment)
            .bind(&component.currency)
            .bind(&component.unit)
            .bind(component.value)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(offering_id)
}

#[async_trait]
impl CatalogTransaction for PgCatalogTransaction {
    async fn save_category(&mut self, category: &Category) -> Result<i64, AppError> {
        let conn = self.conn()?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO categories (name, display_name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING id
            "#,
        )
        .bind(&category.name)
        .bind(&category.display_name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    async fn save_service(&mut self, service: &Service) -> Result<i64, AppError> {
        let conn = self.conn()?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO services (uri, display_name, comment)
            VALUES ($1, $2, $3)
            ON CONFLICT (uri) DO UPDATE
                SET display_name = EXCLUDED.display_name, comment = EXCLUDED.comment
            RETURNING id
            "#,
        )
        .bind(&service.uri)
        .bind(&service.display_name)
        .bind(&service.comment)
        .fetch_one(&mut *conn)
        .await?;

        let categories: Vec<String> = service.categories.iter().cloned().collect();
        sqlx::query("DELETE FROM service_categories WHERE service_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO service_categories (service_id, category_id)
            SELECT $1, id FROM categories WHERE name = ANY($2)
            "#,
        )
        .bind(id)
        .bind(&categories)
        .execute(&mut *conn)
        .await?;

        Ok(id)
    }

    async fn save_description(
        &mut self,
        description: &Description,
    ) -> Result<Description, AppError> {
        let conn = self.conn()?;

        let id: i64 = match description.id {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE descriptions
                    SET display_name = $2, url = $3, comment = $4, last_editor_id = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&description.display_name)
                .bind(&description.url)
                .bind(&description.comment)
                .bind(description.last_editor_id)
                .execute(&mut *conn)
                .await?;
                id
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO descriptions
                        (store_id, name, display_name, url, comment, creator_id, last_editor_id, registered_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING id
                    "#,
                )
                .bind(description.store_id)
                .bind(&description.name)
                .bind(&description.display_name)
                .bind(&description.url)
                .bind(&description.comment)
                .bind(description.creator_id)
                .bind(description.last_editor_id)
                .bind(description.registered_at)
                .fetch_one(&mut *conn)
                .await?
            }
        };

        let mut saved = description.clone();
        saved.assign_id(id);
        for (position, offering) in saved.offerings.iter_mut().enumerate() {
            let offering_id = write_offering(conn, id, position as i32, offering).await?;
            offering.id = Some(offering_id);
        }

        debug!(description = %saved.name, id, offerings = saved.offerings.len(), "Description written");
        Ok(saved)
    }

    async fn delete_offering(&mut self, offering_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM offerings WHERE id = $1")
            .bind(offering_id)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn delete_description(
        &mut self,
        description_id: i64,
    ) -> Result<Vec<Offering>, AppError> {
        let offerings = self.load_offerings("d.id", description_id).await?;

        sqlx::query("DELETE FROM descriptions WHERE id = $1")
            .bind(description_id)
            .execute(self.conn()?)
            .await?;

        Ok(offerings)
    }

    async fn delete_store(&mut self, store_id: i64) -> Result<Vec<Offering>, AppError> {
        let offerings = self.load_offerings("d.store_id", store_id).await?;

        sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(store_id)
            .execute(self.conn()?)
            .await?;

        Ok(offerings)
    }

    async fn count_service_references(&mut self, uri: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM offering_services os
            JOIN services s ON s.id = os.service_id
            WHERE s.uri = $1
            "#,
        )
        .bind(uri)
        .fetch_one(self.conn()?)
        .await?;

        Ok(count)
    }

    async fn count_category_references(&mut self, name: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM offering_categories oc
            JOIN categories c ON c.id = oc.category_id
            WHERE c.name = $1
            "#,
        )
        .bind(name)
        .fetch_one(self.conn()?)
        .await?;

        Ok(count)
    }

    async fn delete_service(&mut self, uri: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM services WHERE uri = $1")
            .bind(uri)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn delete_category(&mut self, name: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM categories WHERE name = $1")
            .bind(name)
            .execute(self.conn()?)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let tx = self.tx.take().ok_or_else(finished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        let tx = self.tx.take().ok_or_else(finished)?;
        tx.rollback().await?;
        Ok(())
    }
}
