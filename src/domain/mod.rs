//! Domain layer containing catalog entities and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Stores, descriptions, offerings and the shared services/categories
//! - [`repositories`] - Data access trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by the infrastructure layer
//! - Offering resolution and reconciliation live in
//!   [`crate::application::resolution`]; business rules in
//!   [`crate::application::services`]

pub mod entities;
pub mod repositories;
