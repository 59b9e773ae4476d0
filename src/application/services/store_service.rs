//! Store management service.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use validator::Validate;

use super::transaction::finish;
use crate::application::authorization::ensure_creator;
use crate::application::resolution::{OrphanCandidates, SweepReport, sweep_orphans};
use crate::domain::entities::{CreateStore, NewStore, Store, UpdateStore, User};
use crate::domain::repositories::{DescriptionRepository, StoreRepository};
use crate::error::AppError;
use crate::utils::{Page, slugify};

const ALREADY_REGISTERED: &str =
    "There is already a Store with that name/URL registered in the system";

/// Service for creating, updating and deleting stores.
///
/// Deleting a store removes its descriptions and offerings in one catalog
/// transaction and sweeps the services and categories left unreferenced.
pub struct StoreService<S: StoreRepository, D: DescriptionRepository> {
    store_repository: Arc<S>,
    description_repository: Arc<D>,
}

impl<S: StoreRepository, D: DescriptionRepository> StoreService<S, D> {
    pub fn new(store_repository: Arc<S>, description_repository: Arc<D>) -> Self {
        Self {
            store_repository,
            description_repository,
        }
    }

    /// Creates a store owned by `actor`.
    ///
    /// The store name is the slug of its display name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the input is invalid.
    /// Returns [`AppError::Conflict`] if a store with the same name exists.
    pub async fn create(&self, actor: &User, input: CreateStore) -> Result<Store, AppError> {
        input.validate()?;

        let name = slugify(&input.display_name);
        if name.is_empty() {
            return Err(AppError::bad_request(
                "display_name must contain at least one letter or digit",
                json!({ "display_name": input.display_name }),
            ));
        }

        if self.store_repository.find_by_name(&name).await?.is_some() {
            return Err(AppError::conflict(
                ALREADY_REGISTERED,
                json!({ "name": name }),
            ));
        }

        let store = self
            .store_repository
            .create(NewStore {
                name,
                display_name: input.display_name,
                url: input.url,
                comment: input.comment,
                creator_id: actor.id,
            })
            .await?;

        info!(store = %store.name, creator = %actor.user_name, "Store created");
        Ok(store)
    }

    /// Gets a store by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store does not exist.
    pub async fn get(&self, name: &str) -> Result<Store, AppError> {
        self.store_repository
            .find_by_name(name)
            .await?
            .ok_or_else(|| store_not_found(name))
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Store>, AppError> {
        self.store_repository.list(page).await
    }

    /// Applies a partial update. The store name never changes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `actor` did not create the store.
    pub async fn update(
        &self,
        actor: &User,
        name: &str,
        update: UpdateStore,
    ) -> Result<Store, AppError> {
        update.validate()?;

        let mut store = self.get(name).await?;
        ensure_creator(actor, store.creator_id, &format!("update store {name}"))?;

        if let Some(display_name) = update.display_name {
            store.display_name = display_name;
        }
        if let Some(url) = update.url {
            store.url = url;
        }
        if let Some(comment) = update.comment {
            store.comment = Some(comment);
        }
        store.last_editor_id = actor.id;

        let store = self.store_repository.update(store).await?;
        info!(store = %store.name, editor = %actor.user_name, "Store updated");
        Ok(store)
    }

    /// Deletes a store with its descriptions and offerings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `actor` did not create the store.
    pub async fn delete(&self, actor: &User, name: &str) -> Result<SweepReport, AppError> {
        let store = self.get(name).await?;
        ensure_creator(actor, store.creator_id, &format!("delete store {name}"))?;

        let mut tx = self.description_repository.begin().await?;
        let result = async {
            let removed = tx.delete_store(store.id).await?;
            let candidates = OrphanCandidates::from_offerings(&removed);
            sweep_orphans(tx.as_mut(), &candidates).await
        }
        .await;
        let report = finish(tx, result).await?;

        info!(store = %name, "Store deleted");
        Ok(report)
    }
}

fn store_not_found(name: &str) -> AppError {
    AppError::not_found(format!("Store {name} not found"), json!({ "store": name }))
}
