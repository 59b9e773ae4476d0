//! Application layer: offering resolution and business services.
//!
//! Services coordinate repository calls, validation, ownership checks and
//! the resolution engine. They depend on repository traits only, so the
//! same code runs against PostgreSQL, the in-memory catalog and mocks.
//!
//! # Modules
//!
//! - [`resolution`] - Offering resolution engine and description reconciler
//! - [`services`] - Store, description, offering and user services
//! - [`authorization`] - Ownership rules

pub mod authorization;
pub mod resolution;
pub mod services;
