//! Category entity: a service classification shared across offerings.

use serde::Serialize;

/// A classification, identified by its slug `name` (natural key).
///
/// Categories are shared: many services and offerings may reference the same
/// one. A category referenced by no offering is removed by the orphan sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Surrogate id, `None` until persisted.
    pub id: Option<i64>,
    pub name: String,
    pub display_name: String,
}

impl Category {
    /// Creates a transient category.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            display_name: display_name.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
