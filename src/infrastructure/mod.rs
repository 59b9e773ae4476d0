//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and RDF document access.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL and in-memory repository implementations
//! - [`rdf`] - RDF models, SPARQL helpers and the document loader

pub mod persistence;
pub mod rdf;
