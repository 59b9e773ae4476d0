//! Repository trait for offering queries.

use crate::domain::entities::{NewRating, Offering, Rating};
use crate::error::AppError;
use crate::utils::Page;
use async_trait::async_trait;

/// Offering queries and ratings. Offerings themselves are written through
/// the description they belong to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfferingRepository: Send + Sync {
    /// Lists offerings across every store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, page: Page) -> Result<Vec<Offering>, AppError>;

    /// Lists offerings described in any description of a store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_store(&self, store_name: &str, page: Page)
    -> Result<Vec<Offering>, AppError>;

    /// Lists offerings of one description.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_description(
        &self,
        store_name: &str,
        description_name: &str,
        page: Page,
    ) -> Result<Vec<Offering>, AppError>;

    /// Finds an offering by store, description and offering name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find(
        &self,
        store_name: &str,
        description_name: &str,
        offering_name: &str,
    ) -> Result<Option<Offering>, AppError>;

    /// Stores a rating by `user_id` for an offering.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the user already rated the offering.
    async fn create_rating(
        &self,
        offering_id: i64,
        user_id: i64,
        rating: NewRating,
    ) -> Result<Rating, AppError>;

    /// Finds a rating of the given offering.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_rating(&self, offering_id: i64, rating_id: i64)
    -> Result<Option<Rating>, AppError>;

    /// Lists the ratings of an offering, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_ratings(&self, offering_id: i64) -> Result<Vec<Rating>, AppError>;

    /// Persists the score and comment of an existing rating.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the rating no longer exists.
    async fn update_rating(&self, rating: Rating) -> Result<Rating, AppError>;
}
