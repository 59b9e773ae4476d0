//! Marketplace user entity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

/// A registered marketplace user.
///
/// Users own the stores and descriptions they create; only the owner may
/// modify or delete them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub display_name: String,
    pub email: String,
    pub company: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Input data for registering a new user.
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 4, max = 30))]
    pub user_name: String,
    #[validate(length(min = 3, max = 100))]
    pub display_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 100))]
    pub company: Option<String>,
}

/// Partial update of a user profile. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 100))]
    pub display_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub company: Option<String>,
}
