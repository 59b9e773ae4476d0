//! In-memory catalog implementing every repository trait.
//!
//! Used by the `resolve` command and integration tests. All entities live in
//! one [`CatalogTables`] arena behind a mutex. A transaction works on a
//! snapshot of the tables and swaps it in on commit, so concurrent
//! transactions resolve as last-commit-wins.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;

use crate::domain::entities::{
    Category, Description, NewRating, NewStore, NewUser, Offering, Rating, Service, Store, User,
};
use crate::domain::repositories::{
    CatalogTransaction, CategoryRepository, DescriptionRepository, OfferingRepository,
    ServiceRepository, StoreRepository, UserRepository,
};
use crate::error::AppError;
use crate::utils::Page;

#[derive(Debug, Clone, Default)]
struct CatalogTables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    stores: BTreeMap<i64, Store>,
    descriptions: BTreeMap<i64, Description>,
    services: BTreeMap<String, Service>,
    categories: BTreeMap<String, Category>,
    ratings: BTreeMap<i64, Rating>,
}

impl CatalogTables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn store_by_name(&self, name: &str) -> Option<&Store> {
        self.stores.values().find(|s| s.name == name)
    }

    fn description(&self, store_name: &str, name: &str) -> Option<&Description> {
        let store = self.store_by_name(store_name)?;
        self.descriptions
            .values()
            .find(|d| d.store_id == store.id && d.name == name)
    }

    fn offerings(&self) -> impl Iterator<Item = &Offering> {
        self.descriptions.values().flat_map(|d| d.offerings.iter())
    }

    /// Drops ratings whose offering is gone.
    fn prune_ratings(&mut self) {
        let live: HashSet<i64> = self.offerings().filter_map(|o| o.id).collect();
        self.ratings.retain(|_, r| live.contains(&r.offering_id));
    }
}

/// Shared in-memory catalog.
///
/// Cloning is cheap; clones see the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tables: Arc<Mutex<CatalogTables>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryCatalog {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;

        if tables
            .users
            .values()
            .any(|u| u.user_name == new_user.user_name || u.email == new_user.email)
        {
            return Err(AppError::conflict(
                "User name or email already registered",
                json!({ "user_name": new_user.user_name, "email": new_user.email }),
            ));
        }

        let user = User {
            id: tables.next_id(),
            user_name: new_user.user_name,
            display_name: new_user.display_name,
            email: new_user.email,
            company: new_user.company,
            registered_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_name(&self, user_name: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.user_name == user_name)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        Ok(users)
    }

    async fn update(&self, user: User) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;

        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(AppError::conflict(
                "Email already registered",
                json!({ "email": user.email }),
            ));
        }

        match tables.users.get_mut(&user.id) {
            Some(stored) => {
                stored.display_name = user.display_name;
                stored.email = user.email;
                stored.company = user.company;
                Ok(stored.clone())
            }
            None => Err(AppError::not_found(
                "User not found",
                json!({ "user_name": user.user_name }),
            )),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;

        let owns_entities = tables.stores.values().any(|s| s.creator_id == id)
            || tables.descriptions.values().any(|d| d.creator_id == id)
            || tables.ratings.values().any(|r| r.user_id == id);
        if owns_entities {
            return Err(AppError::conflict(
                "Entity is still referenced",
                json!({ "user_id": id }),
            ));
        }

        tables
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("User not found", json!({ "id": id })))
    }
}

#[async_trait]
impl StoreRepository for InMemoryCatalog {
    async fn create(&self, new_store: NewStore) -> Result<Store, AppError> {
        let mut tables = self.tables.lock().await;

        if tables.store_by_name(&new_store.name).is_some() {
            return Err(AppError::conflict(
                "Store name already registered",
                json!({ "name": new_store.name }),
            ));
        }

        let store = Store {
            id: tables.next_id(),
            name: new_store.name,
            display_name: new_store.display_name,
            url: new_store.url,
            comment: new_store.comment,
            creator_id: new_store.creator_id,
            last_editor_id: new_store.creator_id,
            registered_at: Utc::now(),
        };
        tables.stores.insert(store.id, store.clone());
        Ok(store)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Store>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.store_by_name(name).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<Store>, AppError> {
        let tables = self.tables.lock().await;
        Ok(page.slice(tables.stores.values().cloned()))
    }

    async fn update(&self, store: Store) -> Result<Store, AppError> {
        let mut tables = self.tables.lock().await;

        match tables.stores.get_mut(&store.id) {
            Some(stored) => {
                stored.display_name = store.display_name;
                stored.url = store.url;
                stored.comment = store.comment;
                stored.last_editor_id = store.last_editor_id;
                Ok(stored.clone())
            }
            None => Err(AppError::not_found(
                "Store not found",
                json!({ "store": store.name }),
            )),
        }
    }
}

#[async_trait]
impl DescriptionRepository for InMemoryCatalog {
    async fn find_by_name_and_store(
        &self,
        store_name: &str,
        name: &str,
    ) -> Result<Option<Description>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.description(store_name, name).cloned())
    }

    async fn list_by_store(
        &self,
        store_id: i64,
        page: Page,
    ) -> Result<Vec<Description>, AppError> {
        let tables = self.tables.lock().await;
        Ok(page.slice(
            tables
                .descriptions
                .values()
                .filter(|d| d.store_id == store_id)
                .cloned(),
        ))
    }

    async fn begin(&self) -> Result<Box<dyn CatalogTransaction>, AppError> {
        let snapshot = self.tables.lock().await.clone();
        Ok(Box::new(InMemoryTransaction {
            tables: Arc::clone(&self.tables),
            working: Some(snapshot),
        }))
    }
}

#[async_trait]
impl OfferingRepository for InMemoryCatalog {
    async fn list(&self, page: Page) -> Result<Vec<Offering>, AppError> {
        let tables = self.tables.lock().await;
        let mut offerings: Vec<&Offering> = tables.offerings().collect();
        offerings.sort_by_key(|o| o.id);
        Ok(page.slice(offerings.into_iter().cloned()))
    }

    async fn list_by_store(&self, store_name: &str, page: Page) -> Result<Vec<Offering>, AppError> {
        let tables = self.tables.lock().await;
        let Some(store) = tables.store_by_name(store_name) else {
            return Ok(Vec::new());
        };

        Ok(page.slice(
            tables
                .descriptions
                .values()
                .filter(|d| d.store_id == store.id)
                .flat_map(|d| d.offerings.iter().cloned()),
        ))
    }

    async fn list_by_description(
        &self,
        store_name: &str,
        description_name: &str,
        page: Page,
    ) -> Result<Vec<Offering>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .description(store_name, description_name)
            .map(|d| page.slice(d.offerings.iter().cloned()))
            .unwrap_or_default())
    }

    async fn find(
        &self,
        store_name: &str,
        description_name: &str,
        offering_name: &str,
    ) -> Result<Option<Offering>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .description(store_name, description_name)
            .and_then(|d| d.offerings.iter().find(|o| o.name == offering_name))
            .cloned())
    }

    async fn create_rating(
        &self,
        offering_id: i64,
        user_id: i64,
        rating: NewRating,
    ) -> Result<Rating, AppError> {
        let mut tables = self.tables.lock().await;

        if !tables.offerings().any(|o| o.id == Some(offering_id)) {
            return Err(AppError::not_found(
                "Offering not found",
                json!({ "offering_id": offering_id }),
            ));
        }
        if tables
            .ratings
            .values()
            .any(|r| r.offering_id == offering_id && r.user_id == user_id)
        {
            return Err(AppError::conflict(
                "You have already rated this offering",
                json!({ "offering_id": offering_id }),
            ));
        }

        let rating = Rating {
            id: tables.next_id(),
            offering_id,
            user_id,
            score: rating.score,
            comment: rating.comment,
            rated_at: Utc::now(),
        };
        tables.ratings.insert(rating.id, rating.clone());
        Ok(rating)
    }

    async fn find_rating(
        &self,
        offering_id: i64,
        rating_id: i64,
    ) -> Result<Option<Rating>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ratings
            .get(&rating_id)
            .filter(|r| r.offering_id == offering_id)
            .cloned())
    }

    async fn list_ratings(&self, offering_id: i64) -> Result<Vec<Rating>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ratings
            .values()
            .filter(|r| r.offering_id == offering_id)
            .cloned()
            .collect())
    }

    async fn update_rating(&self, rating: Rating) -> Result<Rating, AppError> {
        let mut tables = self.tables.lock().await;

        match tables.ratings.get_mut(&rating.id) {
            Some(stored) => {
                stored.score = rating.score;
                stored.comment = rating.comment;
                Ok(stored.clone())
            }
            None => Err(AppError::not_found(
                format!("Rating {} not found", rating.id),
                json!({ "rating": rating.id }),
            )),
        }
    }
}

#[async_trait]
impl ServiceRepository for InMemoryCatalog {
    async fn find_by_uri(&self, uri: &str) -> Result<Option<Service>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.services.get(uri).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCatalog {
    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.values().cloned().collect())
    }
}

/// Snapshot transaction over an [`InMemoryCatalog`].
pub struct InMemoryTransaction {
    tables: Arc<Mutex<CatalogTables>>,
    working: Option<CatalogTables>,
}

impl InMemoryTransaction {
    fn working(&mut self) -> Result<&mut CatalogTables, AppError> {
        self.working
            .as_mut()
            .ok_or_else(|| AppError::internal("Catalog transaction already finished", json!({})))
    }
}

#[async_trait]
impl CatalogTransaction for InMemoryTransaction {
    async fn save_category(&mut self, category: &Category) -> Result<i64, AppError> {
        let tables = self.working()?;

        if let Some(stored) = tables.categories.get_mut(&category.name)
            && let Some(id) = stored.id
        {
            stored.display_name = category.display_name.clone();
            return Ok(id);
        }

        let id = tables.next_id();
        let mut stored = category.clone();
        stored.id = Some(id);
        tables.categories.insert(stored.name.clone(), stored);
        Ok(id)
    }

    async fn save_service(&mut self, service: &Service) -> Result<i64, AppError> {
        let tables = self.working()?;

        let id = match tables.services.get(&service.uri).and_then(|s| s.id) {
            Some(id) => id,
            None => tables.next_id(),
        };

        let mut stored = service.clone();
        stored.id = Some(id);
        stored
            .categories
            .retain(|name| tables.categories.contains_key(name));
        tables.services.insert(stored.uri.clone(), stored);
        Ok(id)
    }

    async fn save_description(
        &mut self,
        description: &Description,
    ) -> Result<Description, AppError> {
        let tables = self.working()?;

        let name_taken = tables.descriptions.values().any(|d| {
            d.store_id == description.store_id
                && d.name == description.name
                && d.id != description.id
        });
        if name_taken {
            return Err(AppError::conflict(
                "Description name already used in this store",
                json!({ "name": description.name }),
            ));
        }

        for offering in &description.offerings {
            let owner = tables
                .descriptions
                .values()
                .find(|d| d.id != description.id && d.offering(&offering.uri).is_some());
            if let Some(owner) = owner {
                return Err(AppError::conflict(
                    "Offering URI already described elsewhere",
                    json!({ "uri": offering.uri, "description": owner.name }),
                ));
            }
        }

        let mut saved = description.clone();
        let id = match saved.id {
            Some(id) => id,
            None => tables.next_id(),
        };
        saved.assign_id(id);
        for offering in &mut saved.offerings {
            if offering.id.is_none() {
                offering.id = Some(tables.next_id());
            }
            offering
                .services
                .retain(|uri| tables.services.contains_key(uri));
            offering
                .categories
                .retain(|name| tables.categories.contains_key(name));
        }

        tables.descriptions.insert(id, saved.clone());
        tables.prune_ratings();
        Ok(saved)
    }

    async fn delete_offering(&mut self, offering_id: i64) -> Result<(), AppError> {
        let tables = self.working()?;
        for description in tables.descriptions.values_mut() {
            description.offerings.retain(|o| o.id != Some(offering_id));
        }
        tables.prune_ratings();
        Ok(())
    }

    async fn delete_description(
        &mut self,
        description_id: i64,
    ) -> Result<Vec<Offering>, AppError> {
        let tables = self.working()?;
        let removed = tables
            .descriptions
            .remove(&description_id)
            .map(|d| d.offerings)
            .unwrap_or_default();
        tables.prune_ratings();
        Ok(removed)
    }

    async fn delete_store(&mut self, store_id: i64) -> Result<Vec<Offering>, AppError> {
        let tables = self.working()?;
        tables.stores.remove(&store_id);

        let ids: Vec<i64> = tables
            .descriptions
            .values()
            .filter(|d| d.store_id == store_id)
            .filter_map(|d| d.id)
            .collect();

        let removed: Vec<Offering> = ids
            .into_iter()
            .filter_map(|id| tables.descriptions.remove(&id))
            .flat_map(|d| d.offerings)
            .collect();
        tables.prune_ratings();
        Ok(removed)
    }

    async fn count_service_references(&mut self, uri: &str) -> Result<i64, AppError> {
        let tables = self.working()?;
        Ok(tables.offerings().filter(|o| o.services.contains(uri)).count() as i64)
    }

    async fn count_category_references(&mut self, name: &str) -> Result<i64, AppError> {
        let tables = self.working()?;
        Ok(tables
            .offerings()
            .filter(|o| o.categories.contains(name))
            .count() as i64)
    }

    async fn delete_service(&mut self, uri: &str) -> Result<(), AppError> {
        let tables = self.working()?;
        tables.services.remove(uri);
        Ok(())
    }

    async fn delete_category(&mut self, name: &str) -> Result<(), AppError> {
        let tables = self.working()?;
        tables.categories.remove(name);
        for service in tables.services.values_mut() {
            service.categories.remove(name);
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let working = self
            .working
            .take()
            .ok_or_else(|| AppError::internal("Catalog transaction already finished", json!({})))?;
        *self.tables.lock().await = working;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        self.working = None;
        Ok(())
    }
}
