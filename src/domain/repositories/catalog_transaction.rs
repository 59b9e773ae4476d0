//! Unit of work for catalog writes.

use crate::domain::entities::{Category, Description, Offering, Service};
use crate::error::AppError;
use async_trait::async_trait;

/// A write transaction over the catalog.
///
/// Every description create/update/delete runs inside one transaction:
/// the shared entities are upserted, the description and its offerings are
/// written, then the orphan sweep counts references and deletes unreferenced
/// services and categories. Reference counts observe the writes made earlier
/// in the same transaction.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgCatalogTransaction`] - PostgreSQL transaction
/// - [`crate::infrastructure::persistence::InMemoryTransaction`] - Snapshot of the in-memory catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Inserts or updates a category by name and returns its id.
    async fn save_category(&mut self, category: &Category) -> Result<i64, AppError>;

    /// Inserts or updates a service by URI, replaces its category edges and
    /// returns its id. Referenced categories must already be saved.
    async fn save_service(&mut self, service: &Service) -> Result<i64, AppError>;

    /// Inserts or updates a description and all of its offerings.
    ///
    /// Offerings with an id are updated in place; offerings without one are
    /// inserted. Price plans and service/category edges of each written
    /// offering are replaced. Returns the description with every id assigned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if an offering URI or the description
    /// name is already used elsewhere.
    async fn save_description(&mut self, description: &Description)
    -> Result<Description, AppError>;

    /// Deletes an offering together with its price plans and edges.
    async fn delete_offering(&mut self, offering_id: i64) -> Result<(), AppError>;

    /// Deletes a description and its offerings; returns the deleted offerings.
    async fn delete_description(&mut self, description_id: i64)
    -> Result<Vec<Offering>, AppError>;

    /// Deletes a store, its descriptions and their offerings; returns the
    /// deleted offerings.
    async fn delete_store(&mut self, store_id: i64) -> Result<Vec<Offering>, AppError>;

    /// Counts offerings, system-wide, that include the service.
    async fn count_service_references(&mut self, uri: &str) -> Result<i64, AppError>;

    /// Counts offerings, system-wide, classified under the category.
    async fn count_category_references(&mut self, name: &str) -> Result<i64, AppError>;

    /// Deletes a service and its category edges.
    async fn delete_service(&mut self, uri: &str) -> Result<(), AppError>;

    /// Deletes a category and its service edges.
    async fn delete_category(&mut self, name: &str) -> Result<(), AppError>;

    /// Makes every write of this transaction durable.
    async fn commit(&mut self) -> Result<(), AppError>;

    /// Discards every write of this transaction.
    async fn rollback(&mut self) -> Result<(), AppError>;
}
