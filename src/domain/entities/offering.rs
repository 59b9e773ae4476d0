//! Offering entity and its exclusively owned price plans.

use serde::Serialize;
use std::collections::BTreeSet;

/// A sellable service bundle extracted from a USDL description.
///
/// The URI is the natural key. Shared entities are referenced by key:
/// `services` holds service URIs, `categories` holds category names.
/// Price plans are owned exclusively and go away with the offering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offering {
    /// Surrogate id, `None` until persisted.
    pub id: Option<i64>,
    pub uri: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub image_url: Option<String>,
    /// Id of the owning description.
    pub described_in: Option<i64>,
    pub services: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub price_plans: Vec<PricePlan>,
}

impl Offering {
    /// Creates a transient offering with empty relation sets.
    pub fn new(
        uri: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            uri: uri.into(),
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            version: None,
            image_url: None,
            described_in: None,
            services: BTreeSet::new(),
            categories: BTreeSet::new(),
            price_plans: Vec::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Adds a price plan unless an equal one is already attached.
    ///
    /// Returns `true` if the plan was added.
    pub fn add_price_plan(&mut self, plan: PricePlan) -> bool {
        if self.price_plans.contains(&plan) {
            return false;
        }
        self.price_plans.push(plan);
        true
    }

    /// Overwrites every mutable field with the values of `fresh`.
    ///
    /// `id`, `uri` and `described_in` are kept so the persisted row (and
    /// anything keyed by it) survives a re-resolution.
    pub fn update_from(&mut self, fresh: Offering) {
        self.name = fresh.name;
        self.display_name = fresh.display_name;
        self.description = fresh.description;
        self.version = fresh.version;
        self.image_url = fresh.image_url;
        self.services = fresh.services;
        self.categories = fresh.categories;
        self.price_plans = fresh.price_plans;
    }
}

/// A price plan of one offering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePlan {
    pub title: Option<String>,
    pub comment: Option<String>,
    pub components: Vec<PriceComponent>,
}

impl PricePlan {
    pub fn new(title: Option<String>, comment: Option<String>) -> Self {
        Self {
            title,
            comment,
            components: Vec::new(),
        }
    }

    /// Adds a component unless an equal one is already attached.
    pub fn add_component(&mut self, component: PriceComponent) -> bool {
        if self.components.contains(&component) {
            return false;
        }
        self.components.push(component);
        true
    }
}

/// A single priced element of a plan, e.g. "10 EUR per month".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceComponent {
    pub title: Option<String>,
    pub comment: Option<String>,
    pub currency: Option<String>,
    pub unit: Option<String>,
    pub value: f64,
}
