//! Repository traits for the shared service and category tables.

use crate::domain::entities::{Category, Service};
use crate::error::AppError;
use async_trait::async_trait;

/// Lookup of persisted services by natural key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Finds a service by exact URI.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_uri(&self, uri: &str) -> Result<Option<Service>, AppError>;
}

/// Lookup of persisted categories by natural key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Finds a category by exact slug name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, AppError>;

    /// Lists every category ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self) -> Result<Vec<Category>, AppError>;
}
