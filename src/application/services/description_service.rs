//! Description registration and re-resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::transaction::finish;
use crate::application::authorization::ensure_creator;
use crate::application::resolution::{
    OrphanCandidates, ReconcileOutcome, ResolveOfferings, ResolvedOfferings, SweepReport,
    reconcile, sweep_orphans,
};
use crate::domain::entities::{
    Category, CreateDescription, Description, Service, Store, UpdateDescription, User,
};
use crate::domain::repositories::{CatalogTransaction, DescriptionRepository, StoreRepository};
use crate::error::AppError;
use crate::utils::{Page, slugify};

const ALREADY_REGISTERED: &str = "There is already an Offering in this Store with that name/URL";

/// Service for registering, re-resolving and deleting descriptions.
///
/// Every create or update resolves the description document, reconciles the
/// result with the stored offerings and writes everything in one catalog
/// transaction: shared entities, the description with its offerings, the
/// removals and finally the orphan sweep. Any failure rolls the whole
/// transaction back, leaving the stored description untouched.
pub struct DescriptionService<S: StoreRepository, D: DescriptionRepository, R: ResolveOfferings> {
    store_repository: Arc<S>,
    description_repository: Arc<D>,
    resolver: Arc<R>,
}

impl<S, D, R> DescriptionService<S, D, R>
where
    S: StoreRepository,
    D: DescriptionRepository,
    R: ResolveOfferings,
{
    pub fn new(store_repository: Arc<S>, description_repository: Arc<D>, resolver: Arc<R>) -> Self {
        Self {
            store_repository,
            description_repository,
            resolver,
        }
    }

    /// Registers a description in a store and resolves its offerings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store does not exist.
    /// Returns [`AppError::Conflict`] if the store already has a description
    /// with the same name, or an offering URI is described elsewhere.
    /// Returns [`AppError::Validation`] if the input is invalid or the
    /// document cannot be parsed.
    pub async fn create(
        &self,
        actor: &User,
        store_name: &str,
        input: CreateDescription,
    ) -> Result<Description, AppError> {
        input.validate()?;

        let store = self.find_store(store_name).await?;

        let name = slugify(&input.display_name);
        if name.is_empty() {
            return Err(AppError::bad_request(
                "display_name must contain at least one letter or digit",
                json!({ "display_name": input.display_name }),
            ));
        }

        if self
            .description_repository
            .find_by_name_and_store(&store.name, &name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                ALREADY_REGISTERED,
                json!({ "store": store.name, "name": name }),
            ));
        }

        let description = Description {
            id: None,
            store_id: store.id,
            name,
            display_name: input.display_name,
            url: input.url,
            comment: input.comment,
            creator_id: actor.id,
            last_editor_id: actor.id,
            registered_at: Utc::now(),
            offerings: Vec::new(),
        };

        let description = self.resolve_and_save(description).await?;
        info!(
            store = %store.name,
            description = %description.name,
            offerings = description.offerings.len(),
            "Description created"
        );
        Ok(description)
    }

    /// Applies a partial update and re-resolves the description.
    ///
    /// The description name never changes. Offerings whose URI is still in
    /// the document keep their ids.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `actor` did not create the
    /// description.
    pub async fn update(
        &self,
        actor: &User,
        store_name: &str,
        name: &str,
        update: UpdateDescription,
    ) -> Result<Description, AppError> {
        update.validate()?;

        let mut description = self.get(store_name, name).await?;
        ensure_creator(actor, description.creator_id, &format!("update offering {name}"))?;

        if let Some(display_name) = update.display_name {
            description.display_name = display_name;
        }
        if let Some(url) = update.url {
            description.url = url;
        }
        if let Some(comment) = update.comment {
            description.comment = Some(comment);
        }
        description.last_editor_id = actor.id;

        let description = self.resolve_and_save(description).await?;
        info!(
            store = %store_name,
            description = %description.name,
            offerings = description.offerings.len(),
            "Description updated"
        );
        Ok(description)
    }

    /// Re-resolves the description document without changing its fields.
    pub async fn refresh(
        &self,
        actor: &User,
        store_name: &str,
        name: &str,
    ) -> Result<Description, AppError> {
        self.update(actor, store_name, name, UpdateDescription::default())
            .await
    }

    /// Gets a description with its offerings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store or description does not exist.
    pub async fn get(&self, store_name: &str, name: &str) -> Result<Description, AppError> {
        self.find_store(store_name).await?;

        self.description_repository
            .find_by_name_and_store(store_name, name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("Description {name} not found in store {store_name}"),
                    json!({ "store": store_name, "description": name }),
                )
            })
    }

    pub async fn list(&self, store_name: &str, page: Page) -> Result<Vec<Description>, AppError> {
        let store = self.find_store(store_name).await?;
        self.description_repository.list_by_store(store.id, page).await
    }

    /// Deletes a description and its offerings, then sweeps orphans.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `actor` did not create the
    /// description.
    pub async fn delete(
        &self,
        actor: &User,
        store_name: &str,
        name: &str,
    ) -> Result<SweepReport, AppError> {
        let description = self.get(store_name, name).await?;
        ensure_creator(actor, description.creator_id, &format!("delete offering {name}"))?;

        let id = description.id.ok_or_else(|| {
            AppError::internal("Stored description has no id", json!({ "description": name }))
        })?;

        let mut tx = self.description_repository.begin().await?;
        let result = async {
            let removed = tx.delete_description(id).await?;
            let candidates = OrphanCandidates::from_offerings(&removed);
            sweep_orphans(tx.as_mut(), &candidates).await
        }
        .await;
        let report = finish(tx, result).await?;

        info!(store = %store_name, description = %name, "Description deleted");
        Ok(report)
    }

    async fn find_store(&self, store_name: &str) -> Result<Store, AppError> {
        self.store_repository
            .find_by_name(store_name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("Store {store_name} not found"),
                    json!({ "store": store_name }),
                )
            })
    }

    async fn resolve_and_save(&self, mut description: Description) -> Result<Description, AppError> {
        let ResolvedOfferings {
            offerings,
            services,
            categories,
        } = self.resolver.resolve_offerings(&description).await?;

        let outcome = reconcile(&mut description, offerings);

        let mut tx = self.description_repository.begin().await?;
        let result = write(tx.as_mut(), &description, &services, &categories, &outcome).await;
        finish(tx, result).await
    }
}

async fn write(
    tx: &mut dyn CatalogTransaction,
    description: &Description,
    services: &BTreeMap<String, Service>,
    categories: &BTreeMap<String, Category>,
    outcome: &ReconcileOutcome,
) -> Result<Description, AppError> {
    for category in categories.values() {
        tx.save_category(category).await?;
    }
    for service in services.values() {
        tx.save_service(service).await?;
    }

    for removed in &outcome.removed {
        if let Some(id) = removed.id {
            tx.delete_offering(id).await?;
        }
    }

    let saved = tx.save_description(description).await?;
    sweep_orphans(tx, &outcome.orphan_candidates).await?;

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::resolution::{MockResolveOfferings, ResolveError};
    use crate::domain::entities::Offering;
    use crate::domain::repositories::{
        MockCatalogTransaction, MockDescriptionRepository, MockStoreRepository,
    };
    use std::sync::Mutex;

    fn user(id: i64) -> User {
        User {
            id,
            user_name: format!("user{id}"),
            display_name: format!("User {id}"),
            email: format!("user{id}@example.com"),
            company: None,
            registered_at: Utc::now(),
        }
    }

    fn store() -> Store {
        Store {
            id: 5,
            name: "fiware".to_string(),
            display_name: "FIWARE".to_string(),
            url: "https://store.lab.fiware.org".to_string(),
            comment: None,
            creator_id: 1,
            last_editor_id: 1,
            registered_at: Utc::now(),
        }
    }

    fn stored_description() -> Description {
        let mut description = Description {
            id: Some(3),
            store_id: 5,
            name: "sample".to_string(),
            display_name: "Sample".to_string(),
            url: "http://example.com/sample.rdf".to_string(),
            comment: None,
            creator_id: 1,
            last_editor_id: 1,
            registered_at: Utc::now(),
            offerings: Vec::new(),
        };
        let mut a = Offering::new("http://o/a", "a", "A");
        a.id = Some(10);
        a.services.insert("http://s/a".to_string());
        a.categories.insert("cat-b".to_string());
        let mut b = Offering::new("http://o/b", "b", "B");
        b.id = Some(11);
        b.services.insert("http://s/b".to_string());
        b.categories.insert("cat-a".to_string());
        b.categories.insert("cat-b".to_string());
        description.add_offering(a);
        description.add_offering(b);
        description
    }

    fn store_repo() -> MockStoreRepository {
        let mut repo = MockStoreRepository::new();
        repo.expect_find_by_name().returning(|_| Ok(Some(store())));
        repo
    }

    fn create_input() -> CreateDescription {
        CreateDescription {
            display_name: "Sample".to_string(),
            url: "http://example.com/sample.rdf".to_string(),
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_update_writes_merge_and_sweeps() {
        let mut descriptions = MockDescriptionRepository::new();
        descriptions
            .expect_find_by_name_and_store()
            .returning(|_, _| Ok(Some(stored_description())));

        let saved = Arc::new(Mutex::new(None));
        let saved_in_tx = saved.clone();
        descriptions.expect_begin().times(1).returning(move || {
            let saved = saved_in_tx.clone();
            let mut tx = MockCatalogTransaction::new();
            tx.expect_save_category().returning(|_| Ok(1));
            tx.expect_save_service().returning(|_| Ok(1));
            tx.expect_delete_offering()
                .withf(|id| *id == 11)
                .times(1)
                .returning(|_| Ok(()));
            tx.expect_save_description().times(1).returning(move |d| {
                *saved.lock().unwrap() = Some(d.clone());
                Ok(d.clone())
            });
            tx.expect_count_service_references()
                .returning(|uri| Ok(if uri == "http://s/b" { 0 } else { 1 }));
            tx.expect_delete_service()
                .withf(|uri| uri == "http://s/b")
                .times(1)
                .returning(|_| Ok(()));
            tx.expect_count_category_references()
                .returning(|name| Ok(if name == "cat-a" { 0 } else { 1 }));
            tx.expect_delete_category()
                .withf(|name| name == "cat-a")
                .times(1)
                .returning(|_| Ok(()));
            tx.expect_commit().times(1).returning(|| Ok(()));
            Ok(Box::new(tx) as Box<dyn CatalogTransaction>)
        });

        let mut resolver = MockResolveOfferings::new();
        resolver.expect_resolve_offerings().times(1).returning(|_| {
            let mut a = Offering::new("http://o/a", "a-2", "A 2");
            a.services.insert("http://s/a".to_string());
            a.categories.insert("cat-b".to_string());
            let c = Offering::new("http://o/c", "c", "C");
            let mut resolved = ResolvedOfferings::default();
            resolved.offerings = vec![a, c];
            resolved
                .services
                .insert("http://s/a".to_string(), Service::new("http://s/a"));
            resolved
                .categories
                .insert("cat-b".to_string(), Category::new("cat-b", "Cat B"));
            Ok(resolved)
        });

        let service = DescriptionService::new(
            Arc::new(store_repo()),
            Arc::new(descriptions),
            Arc::new(resolver),
        );
        service.refresh(&user(1), "fiware", "sample").await.unwrap();

        let written = saved.lock().unwrap().clone().unwrap();
        let uris: Vec<_> = written.offerings.iter().map(|o| o.uri.as_str()).collect();
        assert_eq!(uris, vec!["http://o/a", "http://o/c"]);
        assert_eq!(written.offering("http://o/a").unwrap().id, Some(10));
        assert_eq!(written.offering("http://o/a").unwrap().name, "a-2");
        assert_eq!(written.offering("http://o/c").unwrap().id, None);
    }

    #[tokio::test]
    async fn test_parse_failure_writes_nothing() {
        let mut descriptions = MockDescriptionRepository::new();
        descriptions
            .expect_find_by_name_and_store()
            .returning(|_, _| Ok(Some(stored_description())));
        descriptions.expect_begin().times(0);

        let mut resolver = MockResolveOfferings::new();
        resolver
            .expect_resolve_offerings()
            .returning(|_| Err(ResolveError::Parse("bad token".to_string())));

        let service = DescriptionService::new(
            Arc::new(store_repo()),
            Arc::new(descriptions),
            Arc::new(resolver),
        );
        let err = service.refresh(&user(1), "fiware", "sample").await.unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.message(), "Your RDF could not be parsed");
    }

    #[tokio::test]
    async fn test_write_failure_rolls_back() {
        let mut descriptions = MockDescriptionRepository::new();
        descriptions
            .expect_find_by_name_and_store()
            .returning(|_, _| Ok(None));
        descriptions.expect_begin().times(1).returning(|| {
            let mut tx = MockCatalogTransaction::new();
            tx.expect_save_description().returning(|_| {
                Err(AppError::conflict("Offering URI already described", json!({})))
            });
            tx.expect_commit().times(0);
            tx.expect_rollback().times(1).returning(|| Ok(()));
            Ok(Box::new(tx) as Box<dyn CatalogTransaction>)
        });

        let mut resolver = MockResolveOfferings::new();
        resolver.expect_resolve_offerings().returning(|_| {
            Ok(ResolvedOfferings {
                offerings: vec![Offering::new("http://o/a", "a", "A")],
                ..Default::default()
            })
        });

        let service = DescriptionService::new(
            Arc::new(store_repo()),
            Arc::new(descriptions),
            Arc::new(resolver),
        );
        let err = service
            .create(&user(2), "fiware", create_input())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_duplicate_name_conflicts() {
        let mut descriptions = MockDescriptionRepository::new();
        descriptions
            .expect_find_by_name_and_store()
            .withf(|store, name| store == "fiware" && name == "sample")
            .returning(|_, _| Ok(Some(stored_description())));
        descriptions.expect_begin().times(0);

        let mut resolver = MockResolveOfferings::new();
        resolver.expect_resolve_offerings().times(0);

        let service = DescriptionService::new(
            Arc::new(store_repo()),
            Arc::new(descriptions),
            Arc::new(resolver),
        );
        let err = service
            .create(&user(1), "fiware", create_input())
            .await
            .unwrap_err();

        assert_eq!(err.message(), ALREADY_REGISTERED);
    }

    #[tokio::test]
    async fn test_delete_by_other_user_is_unauthorized() {
        let mut descriptions = MockDescriptionRepository::new();
        descriptions
            .expect_find_by_name_and_store()
            .returning(|_, _| Ok(Some(stored_description())));
        descriptions.expect_begin().times(0);

        let service = DescriptionService::new(
            Arc::new(store_repo()),
            Arc::new(descriptions),
            Arc::new(MockResolveOfferings::new()),
        );
        let err = service
            .delete(&user(2), "fiware", "sample")
            .await
            .unwrap_err();

        assert_eq!(err.message(), "You are not authorized to delete offering sample");
    }

    #[tokio::test]
    async fn test_missing_store_is_not_found() {
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_name().returning(|_| Ok(None));

        let service = DescriptionService::new(
            Arc::new(stores),
            Arc::new(MockDescriptionRepository::new()),
            Arc::new(MockResolveOfferings::new()),
        );
        let err = service.get("nowhere", "sample").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
