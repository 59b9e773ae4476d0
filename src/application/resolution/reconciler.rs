//! Merging a freshly resolved offering set into a persisted description.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::domain::entities::{Description, Offering};
use crate::domain::repositories::CatalogTransaction;
use crate::error::AppError;

/// Services and categories that may have lost their last reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanCandidates {
    pub services: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl OrphanCandidates {
    /// Adds every service and category referenced by `offering`.
    pub fn collect(&mut self, offering: &Offering) {
        self.services.extend(offering.services.iter().cloned());
        self.categories.extend(offering.categories.iter().cloned());
    }

    pub fn from_offerings<'a>(offerings: impl IntoIterator<Item = &'a Offering>) -> Self {
        let mut candidates = Self::default();
        for offering in offerings {
            candidates.collect(offering);
        }
        candidates
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.categories.is_empty()
    }
}

/// What [`reconcile`] changed in a description.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// URIs of offerings added to the description.
    pub inserted: Vec<String>,
    /// URIs of persisted offerings updated in place.
    pub updated: Vec<String>,
    /// Offerings detached from the description, with their ids.
    pub removed: Vec<Offering>,
    /// Previous references of updated and removed offerings.
    pub orphan_candidates: OrphanCandidates,
}

/// Services and categories deleted by [`sweep_orphans`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted_services: Vec<String>,
    pub deleted_categories: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.deleted_services.is_empty() && self.deleted_categories.is_empty()
    }
}

/// Merges `fresh` into the offerings of `description`.
///
/// Offerings are matched by URI. A match is updated in place, keeping its
/// id and back-reference; an unmatched fresh offering is added; a persisted
/// offering absent from `fresh` is removed. The resulting order follows
/// `fresh`. Nothing is written: the caller persists the description and the
/// removals, then runs [`sweep_orphans`] with the returned candidates.
pub fn reconcile(description: &mut Description, fresh: Vec<Offering>) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    let mut persisted: Vec<Option<Offering>> =
        description.take_offerings().into_iter().map(Some).collect();
    let index: HashMap<String, usize> = persisted
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.as_ref().map(|o| (o.uri.clone(), i)))
        .collect();

    let mut merged = HashSet::new();

    for offering in fresh {
        if !merged.insert(offering.uri.clone()) {
            debug!(uri = %offering.uri, "Ignoring repeated offering");
            continue;
        }

        match index.get(&offering.uri).and_then(|&i| persisted[i].take()) {
            Some(mut existing) => {
                outcome.orphan_candidates.collect(&existing);
                existing.update_from(offering);
                outcome.updated.push(existing.uri.clone());
                description.add_offering(existing);
            }
            None => {
                outcome.inserted.push(offering.uri.clone());
                description.add_offering(offering);
            }
        }
    }

    for removed in persisted.into_iter().flatten() {
        outcome.orphan_candidates.collect(&removed);
        outcome.removed.push(removed);
    }

    info!(
        description = %description.name,
        inserted = outcome.inserted.len(),
        updated = outcome.updated.len(),
        removed = outcome.removed.len(),
        "Reconciled offerings"
    );

    outcome
}

/// Deletes every candidate no offering in the system references anymore.
///
/// Must run after the description write so reference counts observe it.
/// Services are swept before categories.
///
/// # Errors
///
/// Returns any storage error; the caller rolls the transaction back.
pub async fn sweep_orphans(
    tx: &mut dyn CatalogTransaction,
    candidates: &OrphanCandidates,
) -> Result<SweepReport, AppError> {
    let mut report = SweepReport::default();

    for uri in &candidates.services {
        if tx.count_service_references(uri).await? == 0 {
            tx.delete_service(uri).await?;
            report.deleted_services.push(uri.clone());
        }
    }

    for name in &candidates.categories {
        if tx.count_category_references(name).await? == 0 {
            tx.delete_category(name).await?;
            report.deleted_categories.push(name.clone());
        }
    }

    if !report.is_empty() {
        info!(
            services = ?report.deleted_services,
            categories = ?report.deleted_categories,
            "Swept orphaned entities"
        );
    }

    Ok(report)
}
