//! Repository implementations.
//!
//! PostgreSQL repositories use SQLx runtime queries against the catalog
//! schema. [`InMemoryCatalog`] implements every repository trait over a
//! single in-process arena.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - Marketplace users
//! - [`PgStoreRepository`] - Stores
//! - [`PgDescriptionRepository`] - Descriptions with their offerings
//! - [`PgOfferingRepository`] - Offering queries
//! - [`PgServiceRepository`], [`PgCategoryRepository`] - Shared entity lookups
//! - [`PgCatalogTransaction`] - Write transaction for catalog updates
//!
//! [`pool::connect`] builds the connection pool from [`crate::config::Config`].

pub mod memory;
pub mod pg_catalog_transaction;
pub mod pg_description_repository;
pub mod pg_offering_repository;
pub mod pg_service_repository;
pub mod pg_store_repository;
pub mod pg_user_repository;
pub mod pool;

pub use memory::{InMemoryCatalog, InMemoryTransaction};
pub use pg_catalog_transaction::PgCatalogTransaction;
pub use pg_description_repository::PgDescriptionRepository;
pub use pg_offering_repository::PgOfferingRepository;
pub use pg_service_repository::{PgCategoryRepository, PgServiceRepository};
pub use pg_store_repository::PgStoreRepository;
pub use pg_user_repository::PgUserRepository;
