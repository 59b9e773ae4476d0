//! RDF access: document loading and typed SPARQL helpers.
//!
//! - [`model`] - [`RdfModel`], an in-memory `oxigraph` graph with URI/literal/label queries
//! - [`loader`] - [`ModelLoader`] and its HTTP/file implementation
//! - [`vocabulary`] - Linked USDL prefixes and terms

pub mod loader;
pub mod model;
pub mod vocabulary;

pub use loader::{HttpModelLoader, ModelLoader};
pub use model::{RdfError, RdfModel, strip_delimiters};

#[cfg(test)]
pub use loader::MockModelLoader;
