//! Description entity: a registered USDL document and its offerings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use super::offering::Offering;

/// A remote service description registered in a store.
///
/// The offerings list is only mutated through [`Description::add_offering`]
/// and [`Description::take_offerings`], which keep each offering's
/// `described_in` back-reference consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Description {
    /// Surrogate id, `None` until persisted.
    pub id: Option<i64>,
    pub store_id: i64,
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub comment: Option<String>,
    pub creator_id: i64,
    pub last_editor_id: i64,
    pub registered_at: DateTime<Utc>,
    pub offerings: Vec<Offering>,
}

impl Description {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Appends an offering and points it at this description.
    pub fn add_offering(&mut self, mut offering: Offering) {
        offering.described_in = self.id;
        self.offerings.push(offering);
    }

    /// Removes and returns every offering, clearing back-references.
    pub fn take_offerings(&mut self) -> Vec<Offering> {
        let mut offerings = std::mem::take(&mut self.offerings);
        for offering in &mut offerings {
            offering.described_in = None;
        }
        offerings
    }

    pub fn offering(&self, uri: &str) -> Option<&Offering> {
        self.offerings.iter().find(|o| o.uri == uri)
    }

    /// Points every offering at `id`; called once the description row exists.
    pub fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
        for offering in &mut self.offerings {
            offering.described_in = Some(id);
        }
    }
}

/// Validated input for registering a description in a store.
#[derive(Debug, Clone, Validate)]
pub struct CreateDescription {
    #[validate(length(min = 3, max = 100))]
    pub display_name: String,
    #[validate(custom(function = "crate::utils::validation::document_url"))]
    pub url: String,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Partial description update. `None` fields are left unchanged; the
/// description is re-resolved regardless.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateDescription {
    #[validate(length(min = 3, max = 100))]
    pub display_name: Option<String>,
    #[validate(custom(function = "crate::utils::validation::document_url"))]
    pub url: Option<String>,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}
