//! Offering resolution: from a USDL document to a reconciled offering set.
//!
//! - [`resolver`] - walks an RDF model and builds offerings, services and categories
//! - [`cache`] - per-run arena that keeps one instance per natural key
//! - [`reconciler`] - merges resolved offerings into a persisted description
//!   and sweeps orphaned services and categories

pub mod cache;
pub mod reconciler;
pub mod resolver;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::domain::entities::{Category, Description, Offering, Service};
use crate::error::AppError;
use crate::infrastructure::rdf::RdfError;

pub use cache::ResolutionCache;
pub use reconciler::{OrphanCandidates, ReconcileOutcome, SweepReport, reconcile, sweep_orphans};
pub use resolver::OfferingResolver;

/// Errors that abort the resolution of a document.
///
/// An unreachable document is not an error; it resolves to no offerings.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("RDF document could not be parsed: {0}")]
    Parse(String),

    #[error("Price component {component} has an invalid value: {value:?}")]
    InvalidPrice {
        component: String,
        value: Option<String>,
    },

    #[error("SPARQL query failed: {0}")]
    Query(String),

    #[error(transparent)]
    Lookup(#[from] AppError),
}

impl From<RdfError> for ResolveError {
    fn from(e: RdfError) -> Self {
        match e {
            RdfError::Parse(message) => ResolveError::Parse(message),
            RdfError::Query(message) | RdfError::Storage(message) => ResolveError::Query(message),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Parse(reason) => AppError::bad_request(
                "Your RDF could not be parsed",
                json!({ "reason": reason }),
            ),
            ResolveError::InvalidPrice { component, value } => AppError::bad_request(
                "Your RDF contains an invalid price value",
                json!({ "price_component": component, "value": value }),
            ),
            ResolveError::Query(reason) => {
                tracing::error!(reason = %reason, "RDF query failed");
                AppError::internal("RDF query failed", json!({}))
            }
            ResolveError::Lookup(e) => e,
        }
    }
}

/// Result of one resolution run.
///
/// Offerings reference services by URI and categories by name; `services`
/// and `categories` hold the single instance of each referenced entity,
/// either reused from storage (with its id) or newly created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedOfferings {
    pub offerings: Vec<Offering>,
    pub services: BTreeMap<String, Service>,
    pub categories: BTreeMap<String, Category>,
}

impl ResolvedOfferings {
    pub fn is_empty(&self) -> bool {
        self.offerings.is_empty()
    }

    pub fn service(&self, uri: &str) -> Option<&Service> {
        self.services.get(uri)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }
}

/// Resolves the offerings described by a description's document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResolveOfferings: Send + Sync {
    /// Fetches the description URL and extracts its offering graph.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Parse`] if the document is not valid RDF and
    /// [`ResolveError::InvalidPrice`] if a price value is not a number.
    async fn resolve_offerings(
        &self,
        description: &Description,
    ) -> Result<ResolvedOfferings, ResolveError>;
}
