//! Per-run deduplication of shared entities.

use std::collections::BTreeMap;

use crate::domain::entities::{Category, Service};

/// Entities materialized during one resolution run, keyed by natural key.
///
/// The resolver consults the cache before storage so that two offerings of
/// the same document sharing a service URI or category name end up with a
/// single pending instance. A cache never outlives the run that created it.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    services: BTreeMap<String, Service>,
    categories: BTreeMap<String, Category>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&self, uri: &str) -> Option<&Service> {
        self.services.get(uri)
    }

    /// Stores `service` under its URI, replacing the previous instance.
    pub fn put_service(&mut self, service: Service) {
        self.services.insert(service.uri.clone(), service);
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Stores `category` under its name, replacing the previous instance.
    pub fn put_category(&mut self, category: Category) {
        self.categories.insert(category.name.clone(), category);
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Consumes the cache, yielding the service and category tables.
    pub fn into_parts(self) -> (BTreeMap<String, Service>, BTreeMap<String, Category>) {
        (self.services, self.categories)
    }
}
