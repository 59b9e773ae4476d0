//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern.
//! Concrete implementations live in `crate::infrastructure::persistence`
//! (PostgreSQL and in-memory). Mock implementations are generated with
//! `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`UserRepository`] - Marketplace users
//! - [`StoreRepository`] - Stores
//! - [`DescriptionRepository`] - Descriptions and the write transaction entry point
//! - [`OfferingRepository`] - Offering queries
//! - [`ServiceRepository`], [`CategoryRepository`] - Shared entity lookups by natural key
//! - [`CatalogTransaction`] - Unit of work for catalog writes

pub mod catalog_transaction;
pub mod description_repository;
pub mod offering_repository;
pub mod service_repository;
pub mod store_repository;
pub mod user_repository;

pub use catalog_transaction::CatalogTransaction;
pub use description_repository::DescriptionRepository;
pub use offering_repository::OfferingRepository;
pub use service_repository::{CategoryRepository, ServiceRepository};
pub use store_repository::StoreRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use catalog_transaction::MockCatalogTransaction;
#[cfg(test)]
pub use description_repository::MockDescriptionRepository;
#[cfg(test)]
pub use offering_repository::MockOfferingRepository;
#[cfg(test)]
pub use service_repository::{MockCategoryRepository, MockServiceRepository};
#[cfg(test)]
pub use store_repository::MockStoreRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
