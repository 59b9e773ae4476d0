//! PostgreSQL implementation of user repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

const USER_COLUMNS: &str = "id, user_name, display_name, email, company, registered_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    user_name: String,
    display_name: String,
    email: String,
    company: Option<String>,
    registered_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            user_name: row.user_name,
            display_name: row.display_name,
            email: row.email,
            company: row.company,
            registered_at: row.registered_at,
        }
    }
}

/// PostgreSQL repository for marketplace users.
///
/// `user_name` and `email` carry unique constraints; violations surface as
/// [`AppError::Conflict`].
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (user_name, display_name, email, company)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.user_name)
        .bind(&new_user.display_name)
        .bind(&new_user.email)
        .bind(&new_user.company)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_name(&self, user_name: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_name = $1"))
                .bind(user_name)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(row.map(User::from))
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_name"))
                .fetch_all(self.pool.as_ref())
                .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, user: User) -> Result<User, AppError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET display_name = $2, email = $3, company = $4
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(&user.company)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(User::from).ok_or_else(|| {
            AppError::not_found("User not found", json!({ "user_name": user.user_name }))
        })
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found", json!({ "id": id })));
        }

        Ok(())
    }
}
