//! PostgreSQL implementation of offering queries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgConnection, PgPool};

use crate::domain::entities::{NewRating, Offering, PriceComponent, PricePlan, Rating};
use crate::domain::repositories::OfferingRepository;
use crate::error::AppError;
use crate::utils::Page;

/// Offering columns, aliased `o`, in [`OfferingRow`] order.
pub(crate) const OFFERING_COLUMNS: &str =
    "o.id, o.description_id, o.uri, o.name, o.display_name, o.description, o.version, o.image_url";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OfferingRow {
    pub id: i64,
    pub description_id: i64,
    pub uri: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub image_url: Option<String>,
}

const RATING_COLUMNS: &str = "id, offering_id, user_id, score, comment, rated_at";

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: i64,
    offering_id: i64,
    user_id: i64,
    score: i32,
    comment: Option<String>,
    rated_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            offering_id: row.offering_id,
            user_id: row.user_id,
            score: row.score,
            comment: row.comment,
            rated_at: row.rated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PricePlanRow {
    id: i64,
    offering_id: i64,
    title: Option<String>,
    comment: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PriceComponentRow {
    price_plan_id: i64,
    title: Option<String>,
    comment: Option<String>,
    currency: Option<String>,
    unit: Option<String>,
    value: f64,
}

/// Loads service URIs, category names and price plans for offering rows.
///
/// The order of `rows` is preserved.
pub(crate) async fn hydrate_offerings(
    conn: &mut PgConnection,
    rows: Vec<OfferingRow>,
) -> Result<Vec<Offering>, AppError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let service_edges: Vec<(i64, String)> = sqlx::query_as(
        r#"
        SELECT os.offering_id, s.uri
        FROM offering_services os
        JOIN services s ON s.id = os.service_id
        WHERE os.offering_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let category_edges: Vec<(i64, String)> = sqlx::query_as(
        r#"
        SELECT oc.offering_id, c.name
        FROM offering_categories oc
        JOIN categories c ON c.id = oc.category_id
        WHERE oc.offering_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let plan_rows: Vec<PricePlanRow> = sqlx::query_as(
        r#"
        SELECT id, offering_id, title, comment
        FROM price_plans
        WHERE offering_id = ANY($1)
        ORDER BY offering_id, position
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let plan_ids: Vec<i64> = plan_rows.iter().map(|p| p.id).collect();
    let component_rows: Vec<PriceComponentRow> = sqlx::query_as(
        r#"
        SELECT price_plan_id, title, comment, currency, unit, value
        FROM price_components
        WHERE price_plan_id = ANY($1)
        ORDER BY price_plan_id, position
        "#,
    )
    .bind(&plan_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut components: HashMap<i64, Vec<PriceComponent>> = HashMap::new();
    for row in component_rows {
        components
            .entry(row.price_plan_id)
            .or_default()
            .push(PriceComponent {
                title: row.title,
                comment: row.comment,
                currency: row.currency,
                unit: row.unit,
                value: row.value,
            });
    }

    let mut plans: HashMap<i64, Vec<PricePlan>> = HashMap::new();
    for row in plan_rows {
        let mut plan = PricePlan::new(row.title, row.comment);
        plan.components = components.remove(&row.id).unwrap_or_default();
        plans.entry(row.offering_id).or_default().push(plan);
    }

    let mut offerings: Vec<Offering> = rows
        .into_iter()
        .map(|row| {
            let mut offering = Offering::new(row.uri, row.name, row.display_name);
            offering.id = Some(row.id);
            offering.described_in = Some(row.description_id);
            offering.description = row.description;
            offering.version = row.version;
            offering.image_url = row.image_url;
            offering.price_plans = plans.remove(&row.id).unwrap_or_default();
            offering
        })
        .collect();

    let index: HashMap<i64, usize> = offerings
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.id.map(|id| (id, i)))
        .collect();

    for (offering_id, uri) in service_edges {
        if let Some(&i) = index.get(&offering_id) {
            offerings[i].services.insert(uri);
        }
    }
    for (offering_id, name) in category_edges {
        if let Some(&i) = index.get(&offering_id) {
            offerings[i].categories.insert(name);
        }
    }

    Ok(offerings)
}

/// PostgreSQL repository for offering queries.
pub struct PgOfferingRepository {
    pool: Arc<PgPool>,
}

impl PgOfferingRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferingRepository for PgOfferingRepository {
    async fn list(&self, page: Page) -> Result<Vec<Offering>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<OfferingRow> = sqlx::query_as(&format!(
            "SELECT {OFFERING_COLUMNS} FROM offerings o ORDER BY o.id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *conn)
        .await?;

        hydrate_offerings(&mut conn, rows).await
    }

    async fn list_by_store(&self, store_name: &str, page: Page) -> Result<Vec<Offering>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<OfferingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {OFFERING_COLUMNS}
            FROM offerings o
            JOIN descriptions d ON d.id = o.description_id
            JOIN stores s ON s.id = d.store_id
            WHERE s.name = $1
            ORDER BY d.id, o.position
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(store_name)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *conn)
        .await?;

        hydrate_offerings(&mut conn, rows).await
    }

    async fn list_by_description(
        &self,
        store_name: &str,
        description_name: &str,
        page: Page,
    ) -> Result<Vec<Offering>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<OfferingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {OFFERING_COLUMNS}
            FROM offerings o
            JOIN descriptions d ON d.id = o.description_id
            JOIN stores s ON s.id = d.store_id
            WHERE s.name = $1 AND d.name = $2
            ORDER BY o.position
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(store_name)
        .bind(description_name)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *conn)
        .await?;

        hydrate_offerings(&mut conn, rows).await
    }

    async fn find(
        &self,
        store_name: &str,
        description_name: &str,
        offering_name: &str,
    ) -> Result<Option<Offering>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<OfferingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {OFFERING_COLUMNS}
            FROM offerings o
            JOIN descriptions d ON d.id = o.description_id
            JOIN stores s ON s.id = d.store_id
            WHERE s.name = $1 AND d.name = $2 AND o.name = $3
            ORDER BY o.position
            LIMIT 1
            "#
        ))
        .bind(store_name)
        .bind(description_name)
        .bind(offering_name)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(hydrate_offerings(&mut conn, vec![row]).await?.pop())
    }

    async fn create_rating(
        &self,
        offering_id: i64,
        user_id: i64,
        rating: NewRating,
    ) -> Result<Rating, AppError> {
        let row: RatingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO ratings (offering_id, user_id, score, comment, rated_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(offering_id)
        .bind(user_id)
        .bind(rating.score)
        .bind(&rating.comment)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                AppError::conflict(
                    "You have already rated this offering",
                    json!({ "offering_id": offering_id }),
                )
            } else {
                AppError::from(e)
            }
        })?;

        Ok(row.into())
    }

    async fn find_rating(
        &self,
        offering_id: i64,
        rating_id: i64,
    ) -> Result<Option<Rating>, AppError> {
        let row: Option<RatingRow> = sqlx::query_as(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE id = $1 AND offering_id = $2"
        ))
        .bind(rating_id)
        .bind(offering_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Rating::from))
    }

    async fn list_ratings(&self, offering_id: i64) -> Result<Vec<Rating>, AppError> {
        let rows: Vec<RatingRow> = sqlx::query_as(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE offering_id = $1 ORDER BY rated_at, id"
        ))
        .bind(offering_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn update_rating(&self, rating: Rating) -> Result<Rating, AppError> {
        let row: Option<RatingRow> = sqlx::query_as(&format!(
            r#"
            UPDATE ratings
            SET score = $2, comment = $3
            WHERE id = $1
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating.id)
        .bind(rating.score)
        .bind(&rating.comment)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Rating::from).ok_or_else(|| {
            AppError::not_found(
                format!("Rating {} not found", rating.id),
                json!({ "rating": rating.id }),
            )
        })
    }
}
