//! Repository trait for descriptions and the catalog unit of work.

use super::catalog_transaction::CatalogTransaction;
use crate::domain::entities::Description;
use crate::error::AppError;
use crate::utils::Page;
use async_trait::async_trait;

/// Read access to descriptions plus the entry point for catalog writes.
///
/// Descriptions are always loaded with their offerings (services and
/// categories as keys, price plans inline).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DescriptionRepository: Send + Sync {
    /// Finds a description by store name and description name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_name_and_store(
        &self,
        store_name: &str,
        name: &str,
    ) -> Result<Option<Description>, AppError>;

    /// Lists the descriptions of a store ordered by registration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_store(&self, store_id: i64, page: Page)
    -> Result<Vec<Description>, AppError>;

    /// Opens a write transaction spanning descriptions, offerings and the
    /// shared service and category tables.
    ///
    /// Nothing written through the transaction is visible until
    /// [`CatalogTransaction::commit`]; dropping it without committing
    /// discards every change.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the transaction cannot be started.
    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>, AppError>;
}
