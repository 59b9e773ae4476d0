//! Service entity: a reusable service unit included by offerings.

use serde::Serialize;
use std::collections::BTreeSet;

/// A service, identified by its URI (natural key).
///
/// Services are shared across offerings of any description. Category edges
/// are held as category names (keys into the category table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    /// Surrogate id, `None` until persisted.
    pub id: Option<i64>,
    pub uri: String,
    pub display_name: Option<String>,
    pub comment: Option<String>,
    pub categories: BTreeSet<String>,
}

impl Service {
    /// Creates a transient service with no metadata.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            id: None,
            uri: uri.into(),
            display_name: None,
            comment: None,
            categories: BTreeSet::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
