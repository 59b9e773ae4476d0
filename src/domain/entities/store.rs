//! Store entity: a marketplace shop that groups service descriptions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

/// A store registered in the marketplace.
///
/// `name` is the slug derived from `display_name` at creation time and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub comment: Option<String>,
    pub creator_id: i64,
    pub last_editor_id: i64,
    pub registered_at: DateTime<Utc>,
}

/// Validated input for creating a store.
#[derive(Debug, Clone, Validate)]
pub struct CreateStore {
    #[validate(length(min = 3, max = 100))]
    pub display_name: String,
    #[validate(custom(function = "crate::utils::validation::http_url"))]
    pub url: String,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Partial store update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateStore {
    #[validate(length(min = 3, max = 100))]
    pub display_name: Option<String>,
    #[validate(custom(function = "crate::utils::validation::http_url"))]
    pub url: Option<String>,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Store record handed to the repository on creation.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub comment: Option<String>,
    pub creator_id: i64,
}
