//! Repository trait for stores.

use crate::domain::entities::{NewStore, Store};
use crate::error::AppError;
use crate::utils::Page;
use async_trait::async_trait;

/// Read and write access to store rows.
///
/// Deleting a store cascades into descriptions and offerings and therefore
/// goes through [`super::CatalogTransaction::delete_store`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Creates a new store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a store with the same name exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_store: NewStore) -> Result<Store, AppError>;

    /// Finds a store by its slug name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_name(&self, name: &str) -> Result<Option<Store>, AppError>;

    /// Lists stores ordered by registration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, page: Page) -> Result<Vec<Store>, AppError>;

    /// Writes display name, url, comment and last editor of a store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, store: Store) -> Result<Store, AppError>;
}
